use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let bases: Vec<String> = env::args().skip(1).collect();

    if bases.is_empty() {
        eprintln!("Error: there is no file to read from");
        return ExitCode::FAILURE;
    }

    let mut all_clean = true;
    for base in &bases {
        match octasm::process_file(base) {
            Ok(clean) => all_clean &= clean,
            Err(err) => {
                // A missing or unwritable file sinks this base name only.
                eprintln!("Error: {err:#}");
                all_clean = false;
            }
        }
    }

    if all_clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
