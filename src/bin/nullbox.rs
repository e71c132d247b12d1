use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use nullbox::error::ErrorKind;
use nullbox::file_ops;
use nullbox::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};

/// Terminal attempts allowed before an incorrect passphrase becomes fatal.
const MAX_PASSPHRASE_ATTEMPTS: u32 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "nullbox",
    version,
    about = "Encrypts a file into a NullYex container, or decrypts one back.\n\
             The mode is picked automatically from the file's signature tag."
)]
struct Cli {
    /// File to encrypt or decrypt
    input: PathBuf,

    /// Destination path (default: derived from the input and the mode)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Read passphrase from stdin instead of from terminal
    #[arg(long = "passphrase-stdin", action = ArgAction::SetTrue)]
    passphrase_stdin: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(written) => {
            eprintln!("wrote {}", written.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> nullbox::error::Result<PathBuf> {
    let decrypting = file_ops::is_container(&cli.input)?;
    let output = cli.output.as_deref();

    let make_reader = || -> Box<dyn PassphraseReader> {
        if cli.passphrase_stdin {
            Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
        } else {
            Box::new(TerminalPassphraseReader::new())
        }
    };

    if !decrypting {
        return file_ops::encrypt_file(&cli.input, output, &mut *make_reader());
    }

    // Incorrect and empty passphrases are retryable at the terminal; each
    // attempt re-runs verification from the container's anchor. With
    // --passphrase-stdin there is nothing to re-prompt, so one attempt only.
    let attempts = if cli.passphrase_stdin {
        1
    } else {
        MAX_PASSPHRASE_ATTEMPTS
    };
    let mut attempt = 1;
    loop {
        match file_ops::decrypt_file(&cli.input, output, &mut *make_reader()) {
            Err(err)
                if attempt < attempts
                    && matches!(
                        err.kind,
                        Some(ErrorKind::AuthenticationFailed | ErrorKind::EmptyPassphrase)
                    ) =>
            {
                eprintln!("{} ({} attempts left)", err, attempts - attempt);
                attempt += 1;
            }
            result => return result,
        }
    }
}
