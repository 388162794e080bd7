//! ARMv7 visualizer - CLI Entry Point
//!
//! Commands:
//! - `armv7-viz repl` - Line console
//! - `armv7-viz run <script>` - Run a script, stepping through lines after `@@ break`
//! - `armv7-viz debug [script]` - Interactive terminal UI

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use armviz::session::load_script_file;
use armviz::{EngineConfig, Mode, Session, SessionLog, BREAK_MARKER};

#[derive(Parser)]
#[command(name = "armv7-viz")]
#[command(version = "0.1.0")]
#[command(about = "An instructional ARMv7 register-bank and stack visualizer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args)]
struct EngineArgs {
    /// Bound memory to this many 4-byte words (default: unbounded)
    #[arg(long, global = true)]
    memory_words: Option<u32>,
    /// Also write pushed values into memory
    #[arg(long, global = true)]
    mirror_stack: bool,
    /// Mode whose sp is used by PUSH
    #[arg(long, global = true, default_value = "usr/sys")]
    stack_mode: Mode,
    /// Write a JSON-lines debug log of every executed instruction
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    /// Show debug-level tracing on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read instructions from the console
    Repl {
        /// Script to load first
        #[arg(short, long)]
        script: Option<PathBuf>,
    },
    /// Run a script; lines after `@@ break` run one per confirmation
    Run {
        /// Path to the script
        script: PathBuf,
        /// Run every reserved line without asking
        #[arg(long)]
        no_confirm: bool,
    },
    /// Interactive terminal UI
    #[cfg(feature = "tui")]
    Debug {
        /// Script to load first
        script: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.engine.verbose);

    match cli.command {
        Some(Commands::Repl { script }) => {
            let mut session = open_session(&cli.engine);
            if let Some(path) = script {
                load_into(&mut session, &path);
            }
            if let Err(e) = repl(&mut session) {
                eprintln!("❌ Console error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run { script, no_confirm }) => {
            let mut session = open_session(&cli.engine);
            run_script(&mut session, &script, no_confirm);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { script }) => {
            let mut session = open_session(&cli.engine);
            if let Some(path) = script {
                load_into(&mut session, &path);
            }
            if let Err(e) = armviz::run_debugger(session) {
                eprintln!("❌ Debugger error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("ARMv7 Visualizer v0.1.0");
            println!("Banked registers, stacks and labels, one instruction at a time");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_session(args: &EngineArgs) -> Session {
    if !args.stack_mode.slots().contains(&armviz::Reg::Sp) {
        eprintln!("❌ Mode {} has no stack pointer", args.stack_mode);
        std::process::exit(2);
    }

    let config = EngineConfig {
        memory_words: args.memory_words,
        mirror_stack: args.mirror_stack,
        stack_mode: args.stack_mode,
    };
    let mut session = Session::new(config);

    if let Some(path) = &args.log {
        match SessionLog::create(path) {
            Ok(log) => session.attach_log(log),
            Err(e) => {
                eprintln!("❌ Failed to open log {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
    session
}

/// Load a script into the session, reporting each immediate line.
fn load_into(session: &mut Session, path: &Path) {
    let lines = match load_script_file(path) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!("📂 Loading: {}", path.display());
    let load = session.load_script(lines, BREAK_MARKER);
    for line in &load.results {
        match &line.result {
            Ok(()) => println!("  ✓ {}", line.line),
            Err(e) => println!("  ✗ {}  ({})", line.line, e),
        }
    }
    if load.queued > 0 {
        println!("⏸  {} line(s) reserved after {}", load.queued, BREAK_MARKER);
    }
}

fn run_script(session: &mut Session, path: &Path, no_confirm: bool) {
    load_into(session, path);

    let stdin = io::stdin();
    let mut input = stdin.lock().lines();
    while let Some(next) = session.queue().peek_reserved().map(str::to_string) {
        if !no_confirm {
            print!("next: {}  [Enter to run, q to stop] ", next);
            let _ = io::stdout().flush();
            match input.next() {
                Some(Ok(answer)) if answer.trim().eq_ignore_ascii_case("q") => break,
                Some(Ok(_)) => {}
                _ => break,
            }
        }
        if let Some(step) = session.step_reserved() {
            match step.result {
                Ok(()) => println!("  ✓ {}", step.line),
                Err(e) => println!("  ✗ {}  ({})", step.line, e),
            }
        }
    }

    println!();
    print_state(session);
}

fn repl(session: &mut Session) -> io::Result<()> {
    println!("ARMv7 Visualizer (console)");
    println!("Type 'visualize' to show state, 'step' to run the next reserved line, 'exit' to quit.");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Enter Instruction: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let command = line.trim();

        match command.to_ascii_lowercase().as_str() {
            "" => continue,
            "exit" | "q" => break,
            "visualize" => print_state(session),
            "history" => {
                for (i, entry) in session.history().iter().enumerate() {
                    println!("{:>4}  {}", i + 1, entry);
                }
            }
            "reserved" => {
                for entry in session.reserved() {
                    println!("      {}", entry);
                }
            }
            "step" => match session.step_reserved() {
                Some(step) => match step.result {
                    Ok(()) => println!("Executed: {}", step.line),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Nothing reserved."),
            },
            _ => match session.execute(command) {
                Ok(()) => println!("Executed: {}", command),
                Err(e) => println!("Error: {}", e),
            },
        }
    }

    println!("Exiting.");
    Ok(())
}

fn print_state(session: &Session) {
    println!("━━━ Registers ━━━");
    for bank in session.registers().banks() {
        let regs: Vec<String> = bank
            .iter()
            .map(|(reg, value)| format!("{}=0x{:08X}", reg, value))
            .collect();
        println!("{:>8}: {}", bank.mode(), regs.join(" "));
    }

    println!("━━━ Memory ━━━");
    if session.memory().is_empty() {
        println!("  (empty)");
    }
    for (index, value) in session.memory().iter() {
        println!("  [0x{:08X}]: 0x{:08X}", index.wrapping_mul(4), value);
    }

    println!("━━━ Stack ━━━");
    for mode in session.stack().active_modes() {
        println!("  <{}>", mode);
        for entry in session.stack().entries(mode) {
            println!("    0x{:08X}: 0x{:08X}", entry.address, entry.value);
        }
    }

    if !session.labels().is_empty() {
        println!("━━━ Labels ━━━");
        for (name, addr) in session.labels().iter() {
            println!("  {} = 0x{:08X}", name, addr);
        }
    }
    println!("{}", "-".repeat(40));
}
