use std::{
    fmt::Write as _,
    io::{self, Write as _},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    logs::LoadStats,
    registers::register_name,
    session::{SessionConfig, StepView, TraceSession, DEFAULT_CALL_LOG_NAME, DEFAULT_MEMORY_LOG_NAME},
    trace::{
        window::{DEFAULT_RELOAD_MARGIN, DEFAULT_WINDOW_SIZE},
        LineFetch, WindowConfig, GPR_COUNT,
    },
};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format '{}'. Use 'text' or 'json'", s)),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "trace-engine",
    author,
    version,
    about = "Step through large CPU execution traces with call and memory log context",
    long_about = None
)]
pub struct Args {
    /// Trace file to load
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: PathBuf,

    /// Number of trace lines kept in memory
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: usize,

    /// Distance from the window edge that triggers a prefetch
    #[arg(long, default_value_t = DEFAULT_RELOAD_MARGIN)]
    pub reload_margin: usize,

    /// Call log file name, looked up next to the trace
    #[arg(long, default_value = DEFAULT_CALL_LOG_NAME)]
    pub call_log: String,

    /// Memory log file name, looked up next to the trace
    #[arg(long, default_value = DEFAULT_MEMORY_LOG_NAME)]
    pub memory_log: String,

    /// Zero-based line to start at
    #[arg(short = 'g', long = "goto", default_value_t = 0)]
    pub start_line: usize,

    /// Number of consecutive steps to print
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Seconds to wait for a window reload
    #[arg(long, default_value_t = 30)]
    pub reload_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub trace_file: PathBuf,
    pub session: SessionConfig,
    pub start_line: usize,
    pub count: usize,
    pub format: OutputFormat,
    pub reload_timeout: Duration,
}

impl From<Args> for AppConfig {
    fn from(value: Args) -> Self {
        Self {
            trace_file: value.file,
            session: SessionConfig {
                window: WindowConfig {
                    window_size: value.window_size,
                    reload_margin: value.reload_margin,
                },
                call_log_name: value.call_log,
                memory_log_name: value.memory_log,
            },
            start_line: value.start_line,
            count: value.count,
            format: value.format,
            reload_timeout: Duration::from_secs(value.reload_timeout),
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

pub async fn run(config: AppConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_writer(config, &mut out).await
}

/// Open the trace, jump to the start line and print `count` steps.
pub async fn run_with_writer(config: AppConfig, out: &mut impl io::Write) -> Result<()> {
    let (mut session, warnings) = TraceSession::open(&config.trace_file, &config.session)
        .with_context(|| format!("failed to open trace {}", config.trace_file.display()))?;

    let store = session.store();
    let total = store.total();
    let log_stats = session.log_stats();
    let skipped = |stats: Option<LoadStats>| {
        stats.map_or(0, |stats| stats.malformed_headers + stats.orphan_rows)
    };
    info!(
        trace = %store.path().display(),
        total_lines = total,
        window_size = store.config().window_size,
        reload_margin = store.config().reload_margin,
        call_steps = session.logs().calls().len(),
        memory_steps = session.logs().memory().len(),
        skipped_call_lines = skipped(log_stats.call),
        skipped_memory_lines = skipped(log_stats.memory),
        missing_companions = warnings.len(),
        "Trace session ready",
    );

    if total == 0 {
        writeln!(out, "trace is empty")?;
        return Ok(());
    }
    if !session.store().go_to(config.start_line) {
        bail!(
            "start line {} is out of range (trace has {} lines)",
            config.start_line,
            total
        );
    }

    for step in 0..config.count {
        let line = session.store().cursor();
        let fetched = tokio::time::timeout(config.reload_timeout, session.store().fetch_line(line))
            .await
            .with_context(|| format!("timed out waiting for line {line}"))??;

        match session.view_current() {
            Ok(view) => match config.format {
                OutputFormat::Text => out.write_all(render_text(&view).as_bytes())?,
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&view)?)?,
            },
            Err(LineFetch::Malformed) => {
                warn!(line, "Skipping malformed trace line");
                if config.format == OutputFormat::Text {
                    writeln!(out, "[line {line}] <malformed>")?;
                }
            }
            Err(other) => bail!("line {line} unavailable after reload: {other:?} ({fetched:?})"),
        }

        if step + 1 < config.count && !session.store().next() {
            info!(line, "Reached last trace line");
            break;
        }
    }

    out.flush()?;
    Ok(())
}

/// Plain-text rendering of one step, without any markup.
pub fn render_text(view: &StepView<'_>) -> String {
    let record = &view.record;
    let mut text = String::new();

    let _ = writeln!(
        text,
        "[line {}] step 0x{:x}  addr 0x{:x}  off 0x{:x}  {}",
        view.line, record.step, record.address, record.offset, record.instruction
    );
    if !view.changed.is_empty() {
        let _ = writeln!(text, "  changed: {}", view.changed);
    }

    for (index, value) in record.regs.iter().enumerate() {
        let marker = if view.changed.contains(index) { '*' } else { ' ' };
        let name = register_name(index).unwrap_or_default();
        let _ = write!(text, "  {marker}{name:>3} = 0x{value:016x}");
        if index % 4 == 3 || index + 1 == GPR_COUNT {
            text.push('\n');
        }
    }
    let _ = writeln!(text, "   SP  = 0x{:016x}   PC  = 0x{:016x}", record.sp, record.pc);

    for call in view.calls {
        let _ = writeln!(text, "  call: {}", call.raw);
        for row in &call.dump {
            let _ = writeln!(text, "        {row}");
        }
    }
    for access in view.memory {
        let _ = writeln!(text, "  mem:  {}", access.raw);
        for row in &access.dump {
            let _ = writeln!(text, "        {row}");
        }
    }
    text
}
