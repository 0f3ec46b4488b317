// Command line for bitdelta.
//
// Subcommands create/apply scripts between files (or stdin/stdout) and
// inspect existing scripts without their origin.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::delta::{self, DeltaEncoder, Op};
use crate::hash::config::{self, COPY_OVERHEAD, DeltaConfig, NHASH, PROFILES};

const DEFAULT_LEVEL: u32 = 6;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Content-addressed binary delta tool.
#[derive(Parser, Debug)]
#[command(
    name = "bitdelta",
    version,
    about = "Create and apply binary delta scripts",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create a script turning ORIGIN into the input.
    Create(CreateArgs),
    /// Apply a script to ORIGIN.
    Apply(ApplyArgs),
    /// Print every operation of a script.
    Inspect(InspectArgs),
    /// Print the target size a script declares.
    Size(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Origin file to copy from (default: empty).
    #[arg(long, short = 's', value_hint = ValueHint::FilePath)]
    origin: Option<PathBuf>,

    /// Target file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Script output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Matcher level (0-9).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(0..=9), default_value_t = DEFAULT_LEVEL)]
    level: u32,

    /// Override the collision-chain probe limit of the level's profile.
    #[arg(long = "probe-limit", value_parser = clap::value_parser!(u64).range(1..))]
    probe_limit: Option<u64>,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Origin file the script was created against (default: empty).
    #[arg(long, short = 's', value_hint = ValueHint::FilePath)]
    origin: Option<PathBuf>,

    /// Script file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Skip checksum verification.
    #[arg(long = "no-checksum")]
    no_checksum: bool,

    /// Validate only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Script file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Create,
    Apply,
    Inspect,
    Size,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    level: u32,
    probe_limit: Option<usize>,
    no_checksum: bool,
    no_output: bool,
    origin_file: Option<PathBuf>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            use_stdout: false,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            level: DEFAULT_LEVEL,
            probe_limit: None,
            no_checksum: false,
            no_output: false,
            origin_file: None,
            input_file: None,
            output_file: None,
        }
    }

    fn delta_config(&self) -> DeltaConfig {
        let mut c = config::config_for_level(self.level);
        if let Some(limit) = self.probe_limit {
            c = c.with_probe_limit(limit);
        }
        c.with_verify_checksum(!self.no_checksum)
    }
}

fn resolve_options(mut cli: Cli) -> Options {
    let command = std::mem::replace(&mut cli.command, Cmd::Config);
    match command {
        Cmd::Create(args) => Options {
            use_stdout: args.stdout,
            level: args.level,
            probe_limit: args.probe_limit.map(|n| n as usize),
            origin_file: args.origin,
            input_file: args.input.or(args.input_pos),
            output_file: args.output.or(args.output_pos),
            ..Options::new(Command::Create, &cli)
        },
        Cmd::Apply(args) => Options {
            use_stdout: args.stdout,
            no_checksum: args.no_checksum,
            no_output: args.no_output,
            origin_file: args.origin,
            input_file: args.input.or(args.input_pos),
            output_file: args.output.or(args.output_pos),
            ..Options::new(Command::Apply, &cli)
        },
        Cmd::Inspect(args) => Options {
            input_file: Some(args.input),
            ..Options::new(Command::Inspect, &cli)
        },
        Cmd::Size(args) => Options {
            input_file: Some(args.input),
            ..Options::new(Command::Size, &cli)
        },
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("bitdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli).delta_config();
    }
}

// ---------------------------------------------------------------------------
// Shared I/O
// ---------------------------------------------------------------------------

fn read_origin(opts: &Options) -> Result<Vec<u8>, String> {
    match &opts.origin_file {
        Some(path) => {
            std::fs::read(path).map_err(|e| format!("origin file: {}: {e}", path.display()))
        }
        None => Ok(Vec::new()),
    }
}

fn read_input(opts: &Options) -> Result<Vec<u8>, String> {
    match &opts.input_file {
        Some(path) => {
            std::fs::read(path).map_err(|e| format!("input file: {}: {e}", path.display()))
        }
        None => {
            let mut data = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut data)
                .map_err(|e| format!("read error: {e}"))?;
            Ok(data)
        }
    }
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, String> {
    match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            let f = File::create(path)
                .map_err(|e| format!("output file: {}: {e}", path.display()))?;
            Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, f)))
        }
    }
}

fn write_all(out: &mut dyn Write, data: &[u8]) -> Result<(), String> {
    out.write_all(data)
        .and_then(|()| out.flush())
        .map_err(|e| format!("write error: {e}"))
}

fn print_json(json: &serde_json::Value) {
    match serde_json::to_string_pretty(json) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("bitdelta: json error: {e}"),
    }
}

fn report(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("bitdelta: {msg}");
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("bitdelta version {version}");

    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("NHASH={NHASH}");
    eprintln!("COPY_OVERHEAD={COPY_OVERHEAD}");
    eprintln!("DEFAULT_LEVEL={DEFAULT_LEVEL}");
    for p in PROFILES {
        eprintln!("PROFILE {}: probe_limit={}", p.name, p.probe_limit);
    }
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Create command
// ---------------------------------------------------------------------------

fn cmd_create(opts: &Options) -> Result<(), String> {
    let config = opts.delta_config();
    let origin = read_origin(opts)?;
    let target = read_input(opts)?;

    if u32::try_from(origin.len()).is_err() || u32::try_from(target.len()).is_err() {
        return Err("inputs larger than 4 GiB cannot be described by a script".into());
    }

    let mut out = open_output(opts)?;
    let mut buf = crate::bits::BitBuffer::with_capacity(target.len() / 4 + 64);
    let stats = DeltaEncoder::with_config(config).create_into(&origin, &target, &mut buf);
    write_all(&mut out, buf.as_bytes())?;

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "bitdelta: create: origin size: {}, target size: {}, script size: {}, \
             copies: {} ({} bytes), inserts: {} ({} bytes)",
            origin.len(),
            target.len(),
            buf.len_bytes(),
            stats.copies,
            stats.bytes_copied,
            stats.inserts,
            stats.bytes_inserted
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "create",
            "profile": config.name,
            "probe_limit": config.probe_limit,
            "origin_size": origin.len(),
            "target_size": target.len(),
            "script_size": buf.len_bytes(),
            "copies": stats.copies,
            "inserts": stats.inserts,
            "bytes_copied": stats.bytes_copied,
            "bytes_inserted": stats.bytes_inserted,
            "checksum": stats.checksum,
        }));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Apply command
// ---------------------------------------------------------------------------

fn cmd_apply(opts: &Options) -> Result<(), String> {
    let config = opts.delta_config();
    let origin = read_origin(opts)?;
    let script = read_input(opts)?;

    let output = delta::apply_with_config(&origin, &script, &config)
        .map_err(|e| format!("apply error: {e}"))?;

    if !opts.no_output {
        let mut out = open_output(opts)?;
        write_all(&mut out, &output)?;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "bitdelta: apply: origin size: {}, script size: {}, output size: {}",
            origin.len(),
            script.len(),
            output.len()
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "apply",
            "origin_size": origin.len(),
            "script_size": script.len(),
            "output_size": output.len(),
            "checksum_verified": config.verify_checksum,
        }));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Inspect / size commands
// ---------------------------------------------------------------------------

fn read_script(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn cmd_inspect(opts: &Options) -> Result<(), String> {
    let Some(path) = &opts.input_file else {
        return Err("inspect requires an input file".into());
    };
    let script = read_script(path)?;

    let stats = delta::analyze(&script).map_err(|e| format!("invalid script: {e}"))?;
    let (_, ops) = delta::ops(&script).map_err(|e| format!("invalid script: {e}"))?;

    println!("script size:      {}", script.len());
    println!("target size:      {}", stats.target_len);
    println!(
        "copies:           {} ({} bytes)",
        stats.copies, stats.bytes_copied
    );
    println!(
        "inserts:          {} ({} bytes)",
        stats.inserts, stats.bytes_inserted
    );
    println!("checksum:         {:08X}", stats.checksum);
    println!();
    println!("  Offset Op          Length  Origin");

    let mut target_pos: u64 = 0;
    for op in &ops {
        match op {
            Op::Insert { len, .. } => {
                println!("{target_pos:>8} INSERT {len:>11}");
                target_pos += u64::from(*len);
            }
            Op::Copy { len, offset } => {
                println!("{target_pos:>8} COPY   {len:>11}  @{offset}");
                target_pos += u64::from(*len);
            }
            Op::Checksum(sum) => println!("{target_pos:>8} CHECKSUM    {sum:08X}"),
        }
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "inspect",
            "script_size": script.len(),
            "target_size": stats.target_len,
            "copies": stats.copies,
            "inserts": stats.inserts,
            "bytes_copied": stats.bytes_copied,
            "bytes_inserted": stats.bytes_inserted,
            "checksum": stats.checksum,
        }));
    }

    Ok(())
}

fn cmd_size(opts: &Options) -> Result<(), String> {
    let Some(path) = &opts.input_file else {
        return Err("size requires an input file".into());
    };
    let script = read_script(path)?;
    let size = delta::output_size(&script).map_err(|e| format!("invalid script: {e}"))?;

    println!("{size}");
    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "size",
            "target_size": size,
        }));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn log_filter(opts: &Options) -> &'static str {
    match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout
        && let Some(path) = opts.output_file.take()
        && !opts.quiet
    {
        eprintln!(
            "bitdelta: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let exit_code = match opts.command {
        Command::Create => report(cmd_create(&opts)),
        Command::Apply => report(cmd_apply(&opts)),
        Command::Inspect => report(cmd_inspect(&opts)),
        Command::Size => report(cmd_size(&opts)),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
