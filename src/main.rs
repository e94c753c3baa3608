//! compfile - read and write compressed files by name
//!
//! Small command-line front end over the library: print decompressed files,
//! report detected engines and convert between formats.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use compfile::{default_registry, Engine, EngineOptions, Opener};
use std::io::{self, Write};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("compfile")
        .version(compfile::VERSION)
        .about("Read and write gzip, bzip2, xz and zstd files transparently")
        .long_about(
            "compfile opens files through the compression engine matching their \
             name (.gz, .bz2, .xz, .lzma, .zst) and falls back to plain files \
             for everything else.",
        )
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("TOML file with engine options (requires the `config` feature)"),
        )
        .subcommand(
            Command::new("cat")
                .about("Print the decompressed content of files")
                .arg(
                    Arg::new("binary")
                        .long("binary")
                        .action(ArgAction::SetTrue)
                        .help("Copy raw decompressed bytes instead of decoding UTF-8 text"),
                )
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("detect")
                .about("Show the engine each file would be opened with")
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Fail on files no engine recognises"),
                )
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("compress")
                .about("Copy INPUT to OUTPUT, converting between formats by name")
                .arg(
                    Arg::new("engine")
                        .long("engine")
                        .value_name("NAME")
                        .help("Engine for OUTPUT instead of inferring it (gzip, bzip2, lzma, zstd, plain)"),
                )
                .arg(
                    Arg::new("level")
                        .long("level")
                        .value_name("N")
                        .value_parser(clap::value_parser!(u32))
                        .help("Compression level for OUTPUT"),
                )
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    let options = load_options(&matches)?;

    match matches.subcommand() {
        Some(("cat", args)) => cat(args, &options),
        Some(("detect", args)) => detect(args),
        Some(("compress", args)) => compress(args, options),
        _ => unreachable!("subcommand is required"),
    }
}

#[cfg(feature = "config")]
fn load_options(matches: &ArgMatches) -> Result<EngineOptions> {
    match matches.get_one::<String>("config") {
        Some(path) => EngineOptions::load(std::path::Path::new(path))
            .with_context(|| format!("Failed to load configuration from {}", path)),
        None => EngineOptions::load_default().context("Failed to load default configuration"),
    }
}

#[cfg(not(feature = "config"))]
fn load_options(matches: &ArgMatches) -> Result<EngineOptions> {
    if matches.get_one::<String>("config").is_some() {
        anyhow::bail!("--config requires compfile to be built with the `config` feature");
    }
    Ok(EngineOptions::default())
}

fn files(args: &ArgMatches) -> impl Iterator<Item = &PathBuf> {
    args.get_many::<PathBuf>("files").into_iter().flatten()
}

fn cat(args: &ArgMatches, options: &EngineOptions) -> Result<()> {
    let opener = Opener::new().options(options.clone());
    let binary = args.get_flag("binary");
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for path in files(args) {
        if binary {
            let mut file = opener
                .open(path, "rb")
                .with_context(|| format!("Failed to open {}", path.display()))?;
            io::copy(&mut file, &mut out)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            file.close()?;
        } else {
            let mut file = opener
                .open(path, "r")
                .with_context(|| format!("Failed to open {}", path.display()))?;
            for line in file.iter_lines() {
                let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
                out.write_all(line.as_bytes())?;
            }
            file.close()?;
        }
    }
    out.flush()?;
    Ok(())
}

fn detect(args: &ArgMatches) -> Result<()> {
    let registry = default_registry();
    let strict = args.get_flag("strict");

    for path in files(args) {
        let engine = if strict {
            registry.require(path)?
        } else {
            registry.resolve(path).unwrap_or_else(Engine::plain)
        };
        println!("{}\t{}", path.display(), engine);
    }
    Ok(())
}

fn compress(args: &ArgMatches, mut options: EngineOptions) -> Result<()> {
    let input = args
        .get_one::<PathBuf>("input")
        .context("INPUT is required")?;
    let output = args
        .get_one::<PathBuf>("output")
        .context("OUTPUT is required")?;

    let mut writer_opener = Opener::new();
    let engine = match args.get_one::<String>("engine") {
        Some(name) => {
            let engine = Engine::by_name(name)
                .with_context(|| format!("Unknown or unavailable engine: {}", name))?;
            writer_opener = writer_opener.engine(engine.clone());
            engine
        }
        None => writer_opener.engine_for(output),
    };
    if let Some(level) = args.get_one::<u32>("level") {
        options = options.with_level(engine.name(), *level);
    }

    let mut reader = Opener::new()
        .options(options.clone())
        .open(input, "rb")
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut writer = writer_opener
        .options(options)
        .open(output, "wb")
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let copied = io::copy(&mut reader, &mut writer)
        .with_context(|| format!("Failed to copy {} to {}", input.display(), output.display()))?;
    reader.close()?;
    writer
        .close()
        .with_context(|| format!("Failed to finish {}", output.display()))?;

    log::info!(
        "wrote {} bytes from {} to {} ({})",
        copied,
        input.display(),
        output.display(),
        engine
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!compfile::VERSION.is_empty());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    fn subcommand_args(argv: &[&str]) -> ArgMatches {
        let matches = cli().try_get_matches_from(argv).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        args.clone()
    }

    #[test]
    fn test_cat_defaults_to_text() {
        let args = subcommand_args(&["compfile", "cat", "a.gz"]);
        assert!(!args.get_flag("binary"));
        let args = subcommand_args(&["compfile", "cat", "--binary", "a.gz"]);
        assert!(args.get_flag("binary"));
    }

    #[test]
    fn test_detect_strict_fails_on_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let known = dir.path().join("app.log.gz");
        let unknown = dir.path().join("app.log");
        let known = known.to_str().unwrap();
        let unknown = unknown.to_str().unwrap();

        assert!(detect(&subcommand_args(&["compfile", "detect", "--strict", known])).is_ok());
        assert!(detect(&subcommand_args(&["compfile", "detect", unknown])).is_ok());

        let err = detect(&subcommand_args(&["compfile", "detect", "--strict", known, unknown]))
            .unwrap_err();
        assert!(err.to_string().contains("Cannot infer compression engine"));
    }

    #[test]
    fn test_compress_converts_between_formats() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        let gz = dir.path().join("notes.txt.gz");
        let forced = dir.path().join("notes.out");
        std::fs::write(&input, "abc\ndef\n").unwrap();

        let args = subcommand_args(&[
            "compfile",
            "compress",
            "--level",
            "1",
            input.to_str().unwrap(),
            gz.to_str().unwrap(),
        ]);
        compress(&args, EngineOptions::default()).unwrap();
        assert_eq!(std::fs::read(&gz).unwrap()[..2], [0x1f, 0x8b]);

        // Input engine inferred from the name, output engine forced
        let args = subcommand_args(&[
            "compfile",
            "compress",
            "--engine",
            "bzip2",
            gz.to_str().unwrap(),
            forced.to_str().unwrap(),
        ]);
        compress(&args, EngineOptions::default()).unwrap();
        assert_eq!(&std::fs::read(&forced).unwrap()[..3], b"BZh");

        let text = Opener::new()
            .engine(Engine::bzip2())
            .scoped(&forced, "r", |file| file.read(None))
            .unwrap();
        assert_eq!(text, "abc\ndef\n");
    }

    #[test]
    fn test_compress_rejects_unknown_engine() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "x").unwrap();
        let output = dir.path().join("out.bin");

        let args = subcommand_args(&[
            "compfile",
            "compress",
            "--engine",
            "rar",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
        ]);
        assert!(compress(&args, EngineOptions::default()).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_compress_arguments_parse() {
        let matches = cli()
            .try_get_matches_from(["compfile", "compress", "--level", "3", "in.txt", "out.gz"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "compress");
        assert_eq!(args.get_one::<u32>("level"), Some(&3));
        assert_eq!(
            args.get_one::<PathBuf>("output"),
            Some(&PathBuf::from("out.gz"))
        );
    }
}
