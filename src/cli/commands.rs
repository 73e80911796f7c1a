//! Debug command implementations
//!
//! `--analyze` and `--emit-drivers` run the front half of the pipeline on one file and print what it produced,
//! without compiling anything.

use std::fs;
use std::path::Path;

use miette::{NamedSource, Report};

use crate::backend::driver::synthesize_drivers;
use crate::frontend::analyzer::{self, SourceAnalysis};
use crate::frontend::classifier::{ClassifiedFile, ClassifyOptions, classify_file};

use super::{CliError, CliResult, ExitCode};

/// Maximum source file size (16 MB); test files are never remotely this large.
const MAX_SOURCE_SIZE: u64 = 16 * 1024 * 1024;

/// Read a source file, rejecting unreadable or oversized inputs.
pub fn read_source(path: &Path) -> CliResult<String> {
    let display = path.display();
    let metadata = fs::metadata(path).map_err(|e| CliError::failure(format!("Cannot access file '{display}': {e}")))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{display}' is too large ({} bytes, max {MAX_SOURCE_SIZE} bytes)",
            metadata.len()
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{display}': {e}")))
}

fn analyze(path: &Path, options: ClassifyOptions) -> CliResult<ClassifiedFile> {
    let source = read_source(path)?;
    match analyzer::analyze_source(&source) {
        Ok(analysis) => Ok(classify_file(path, analysis, options)),
        Err(err) => {
            let report = Report::new(err).with_source_code(NamedSource::new(path.display().to_string(), source));
            Err(CliError::failure(format!("{report:?}")))
        }
    }
}

fn describe(analysis: &SourceAnalysis) -> String {
    let mut out = format!(
        "{} {} (line {})\n",
        analysis.unit.kind.as_str(),
        analysis.unit.name,
        analysis.unit.line
    );
    for u in &analysis.uses {
        let note = if u.intrinsic { " (intrinsic)" } else { "" };
        out.push_str(&format!("  use {}{note}\n", u.name));
    }
    out
}

/// Print the analysis and classification of one file.
pub fn analyze_file(path: &Path, options: ClassifyOptions) -> CliResult<ExitCode> {
    let file = analyze(path, options)?;
    print!("{}", describe(&file.analysis));

    if file.tests.is_empty() {
        println!("no test subroutines");
    }
    for test in &file.tests {
        println!(
            "{:>4}  {:<40} {:<10} ({})",
            test.line,
            test.name,
            test.classification.as_str(),
            test.rule.as_str()
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the driver sources synthesized for one file.
pub fn emit_drivers(path: &Path, options: ClassifyOptions) -> CliResult<ExitCode> {
    let file = analyze(path, options)?;
    let drivers = synthesize_drivers(&file);
    if drivers.is_empty() {
        println!("! no drivers: {} has no test subroutines", path.display());
    }

    for driver in &drivers {
        match &driver.source {
            Some(source) => {
                println!("! --- {} ({}) ---", driver.source_file_name(), driver.kind.as_str());
                print!("{source}");
            }
            None => println!("! --- {} compiled as written ({}) ---", path.display(), driver.kind.as_str()),
        }
    }
    Ok(ExitCode::SUCCESS)
}
