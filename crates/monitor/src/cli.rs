use std::path::PathBuf;

#[derive(Debug)]
pub struct Args {
    pub config_path: PathBuf,
}

pub fn parse() -> Args {
    match parse_from(std::env::args().skip(1)) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Version) => {
            println!("vigil-monitor {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        Ok(Parsed::Help) => {
            println!("Usage: vigil-monitor [OPTIONS]\n");
            println!("Options:");
            println!("  -c, --config <PATH>  Configuration file path");
            println!("  -V, --version        Print version");
            println!("  -h, --help           Print help");
            std::process::exit(0);
        }
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    }
}

#[derive(Debug)]
pub enum Parsed {
    Run(Args),
    Version,
    Help,
}

pub fn parse_from<I>(args: I) -> Result<Parsed, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(Parsed::Version),
            "--help" | "-h" => return Ok(Parsed::Help),
            "--config" | "-c" => {
                let path = args.next().ok_or("--config requires a path argument")?;
                return Ok(Parsed::Run(Args {
                    config_path: PathBuf::from(path),
                }));
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Err("--config <path> is required".into())
}
