/*!
  The three modes of the command line tool, as library functions over file paths:

  ```text
  assemble    <input> <output_bin> <log_file>
  interpret   <binary> <start_address> <end_address> <log_file> <result_file>
  view_binary <binary_file>
  ```

  Each file is read or written whole, in one scoped operation.
*/

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info};

use crate::bytecode::{assemble, Assembly, Program};
use crate::config::MachineConfig;
use crate::error::{Error, Result};
use crate::inspect::render_hex;
use crate::state::check_dump_range;
use crate::vm::{execute, Termination};

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
  fs::read(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn read_text(path: &Path) -> Result<String> {
  fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
  fs::write(path, bytes).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
  let text = serde_json::to_string_pretty(value)?;
  fs::write(path, text).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

/**
  Assembles `input`, writing the big-endian binary to `output_bin` and the assembly log as
  JSON to `log_file`. On an assembly error nothing is written.
*/
pub fn assemble_file(input: &Path, output_bin: &Path, log_file: &Path) -> Result<Assembly> {
  let source = read_text(input)?;
  let assembly = assemble(&source)?;

  write_bytes(output_bin, &assembly.program().to_bytes())?;
  info!("Binary file saved to {}", output_bin.display());

  write_json(log_file, &assembly.log)?;
  info!("Log file saved to {}", log_file.display());

  Ok(assembly)
}

/**
  Executes `binary`, then writes the execution trace to `log_file` and the memory cells
  `start..=end` to `result_file`. Both files are written even when execution fails, after which
  the execution error is returned. The range is checked against the configured memory size
  before anything runs, so an invalid range writes nothing.
*/
pub fn interpret_file(
  binary      : &Path,
  start       : usize,
  end         : usize,
  log_file    : &Path,
  result_file : &Path,
  config      : MachineConfig
) -> Result<Termination>
{
  let range = start..=end;
  check_dump_range(&range, config.memory_size)?;

  let program = Program::from_bytes(&read_bytes(binary)?);
  let execution = execute(&program, config);

  if let Err(e) = &execution.outcome {
    error!(pc = e.pc(), "Runtime error: {}", e);
  }

  write_json(log_file, &execution.trace)?;
  info!("Log saved to {}", log_file.display());

  let dump = execution.state.dump(range)?;
  write_json(result_file, &dump)?;
  info!("Results saved to {}", result_file.display());

  Ok(execution.outcome?)
}

/// Reads `path` and renders it as hex.
pub fn view_binary(path: &Path) -> Result<String> {
  Ok(render_hex(&read_bytes(path)?))
}
