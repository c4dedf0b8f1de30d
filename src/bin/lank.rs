use bpaf::Bpaf;
use camino::Utf8PathBuf;
use lank::{point, Batch, Error, PointAction};
use std::process::ExitCode;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// lank - a symlink utility for all things symlink
///
/// Usage:
///     lank SRC DEST
///     lank MATCH REPLACEMENT FILES...
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options)]
struct Options {
    #[bpaf(short, long)]
    /// Verbose output
    verbose: bool,

    #[bpaf(short('N'), long)]
    /// Dry run - print new targets without changing links
    dry_run: bool,

    #[bpaf(short('j'), long)]
    /// Retarget links in parallel
    parallel: bool,

    #[bpaf(short, long, argument("SRC"))]
    /// The symlink to modify
    src: Option<Utf8PathBuf>,

    #[bpaf(short, long, argument("DEST"))]
    /// The new target for the symlink
    dest: Option<String>,

    #[bpaf(short('m'), long("match"), argument("MATCH"))]
    /// Regex applied to the target of each symlink
    pattern: Option<String>,

    #[bpaf(short, long, argument("REPLACEMENT"))]
    /// Replacement for each match, `$1` or `${name}` refer to groups
    replacement: Option<String>,

    #[bpaf(positional("ARGS"))]
    /// SRC DEST, or MATCH REPLACEMENT FILES...
    args: Vec<String>,
}

/// What an invocation asks for, once flags and positionals are reconciled
#[derive(Debug, PartialEq)]
enum Mode {
    Single {
        src: Utf8PathBuf,
        dest: String,
        ignored: Vec<String>,
    },
    Batch {
        pattern: String,
        replacement: String,
        files: Vec<Utf8PathBuf>,
    },
}

impl Mode {
    fn resolve(options: &Options) -> Option<Mode> {
        let mut args = options.args.clone();
        let mut src = options.src.clone();
        let mut dest = options.dest.clone();
        let mut pattern = options.pattern.clone();
        let mut replacement = options.replacement.clone();

        // Positional forms only apply when no mode flag was given
        let no_flags = src.is_none() && dest.is_none() && pattern.is_none() && replacement.is_none();
        if no_flags && args.len() == 2 {
            dest = args.pop();
            src = args.pop().map(Utf8PathBuf::from);
        } else if no_flags && args.len() >= 3 {
            let rest = args.split_off(2);
            replacement = args.pop();
            pattern = args.pop();
            args = rest;
        }

        match (src, dest, pattern, replacement) {
            (Some(src), Some(dest), None, None) => Some(Mode::Single {
                src,
                dest,
                ignored: args,
            }),
            (None, None, Some(pattern), Some(replacement)) => Some(Mode::Batch {
                pattern,
                replacement,
                files: args.into_iter().map(Utf8PathBuf::from).collect(),
            }),
            _ => None,
        }
    }
}

/// Initialize the tracing subscriber with appropriate configuration
///
/// # Arguments
///
/// * `verbose` - If true, sets log level to DEBUG, otherwise INFO
pub fn init_logging(verbose: bool) {
    let filter_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Set up environment filter - allow overriding via RUST_LOG env var
    let env_filter = EnvFilter::builder()
        .with_default_directive(filter_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_level(verbose)
        .with_target(verbose)
        .with_line_number(verbose)
        .without_time()
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    debug!("Logging initialized with level: {}", filter_level);
}

fn main() -> Result<ExitCode, Error> {
    let options = options().run();

    init_logging(options.verbose);

    let Some(mode) = Mode::resolve(&options) else {
        error!("Expected SRC DEST or MATCH REPLACEMENT FILES..., see --help");
        return Ok(ExitCode::from(2));
    };

    debug!("Mode: {:?}", mode);

    match mode {
        Mode::Single { src, dest, ignored } => {
            if !ignored.is_empty() {
                warn!("Ignoring args: {}", ignored.join(" "));
            }
            if options.dry_run {
                println!("{} -> {}", src, dest);
                return Ok(ExitCode::SUCCESS);
            }
            match point(&src, &dest)? {
                PointAction::Created => info!("Created new symlink {}", src),
                PointAction::Retargeted => debug!("Retargeted {}", src),
            }
            Ok(ExitCode::SUCCESS)
        }
        Mode::Batch {
            pattern,
            replacement,
            files,
        } => {
            let batch = Batch::builder()
                .pattern(&pattern)
                .replacement(&replacement)
                .parallel(options.parallel)
                .dry_run(options.dry_run)
                .build()?;

            let report = batch.run(&files);
            print!("{}", report);

            let failed = report.failed().count();
            if failed > 0 {
                warn!("{} of {} link(s) failed", failed, report.len());
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
