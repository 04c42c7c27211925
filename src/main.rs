use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use stackasm::config::{MachineConfig, DEFAULT_MEMORY_SIZE, DEFAULT_STACK_CAPACITY};
use stackasm::driver::{assemble_file, interpret_file, view_binary};

#[derive(Parser)]
#[command(version, about = "Assembler and virtual machine for a 32 bit stack/accumulator ISA")]
struct Args {
  #[command(subcommand)]
  mode: Mode,

  /// Number of memory cells.
  #[arg(long, global = true, default_value_t = DEFAULT_MEMORY_SIZE)]
  memory_size: usize,

  /// Maximum depth of the operand stack.
  #[arg(long, global = true, default_value_t = DEFAULT_STACK_CAPACITY)]
  stack_capacity: usize,

  /// Raise the log level; repeat for more detail.
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,
}

#[derive(Subcommand)]
enum Mode {
  /// Assemble a source file into a binary and a JSON log.
  Assemble {
    input      : PathBuf,
    output_bin : PathBuf,
    log_file   : PathBuf,
  },

  /// Execute a binary, writing the execution trace and a memory range as JSON.
  Interpret {
    binary        : PathBuf,
    start_address : usize,
    end_address   : usize,
    log_file      : PathBuf,
    result_file   : PathBuf,
  },

  /// Print a binary file as hex.
  #[command(name = "view_binary")]
  ViewBinary {
    binary_file : PathBuf,
  },
}

fn main() -> ExitCode {
  let args = Args::parse();

  let level = match args.verbose {
    0 => LevelFilter::WARN,
    1 => LevelFilter::INFO,
    2 => LevelFilter::DEBUG,
    _ => LevelFilter::TRACE,
  };
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_level(true)
    .with_max_level(level)
    .init();

  let config = MachineConfig::default()
    .with_memory_size(args.memory_size)
    .with_stack_capacity(args.stack_capacity);

  let result =
    match &args.mode {

      Mode::Assemble { input, output_bin, log_file } => {
        assemble_file(input, output_bin, log_file).map(|assembly| {
          println!("Assembled {} instruction(s)", assembly.words.len());
          println!("Binary file saved to {}", output_bin.display());
          println!("Log file saved to {}", log_file.display());
        })
      }

      Mode::Interpret { binary, start_address, end_address, log_file, result_file } => {
        interpret_file(binary, *start_address, *end_address, log_file, result_file, config)
          .map(|termination| {
            println!("Execution finished: {:?}", termination);
            println!("Log saved to {}", log_file.display());
            println!("Results saved to {}", result_file.display());
          })
      }

      Mode::ViewBinary { binary_file } => {
        view_binary(binary_file).map(|hex| println!("{}", hex))
      }

    };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("Error: {}", e);
      ExitCode::FAILURE
    }
  }
}
