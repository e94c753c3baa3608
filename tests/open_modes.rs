use std::fs::File;
use std::io::{self, Read, SeekFrom, Write};
use std::path::{Path, PathBuf};

use compfile::{
    with_open, CompFileError, Content, Engine, EngineOptions, FinishWrite, Opener, Registry,
    DEFAULT_PRIORITY,
};
use proptest::prelude::*;

const SAMPLE: &str = "abc\ndef\n";

/// Compressed fixtures written with the compression crates directly
fn write_fixtures(dir: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let plain = dir.join("abc.txt");
    std::fs::write(&plain, SAMPLE).expect("write plain fixture");
    paths.push(plain);

    let gz = dir.join("abc.txt.gz");
    let mut encoder =
        flate2::write::GzEncoder::new(File::create(&gz).unwrap(), flate2::Compression::default());
    encoder.write_all(SAMPLE.as_bytes()).unwrap();
    encoder.finish().unwrap();
    paths.push(gz);

    let bz2 = dir.join("abc.txt.bz2");
    let mut encoder =
        bzip2::write::BzEncoder::new(File::create(&bz2).unwrap(), bzip2::Compression::default());
    encoder.write_all(SAMPLE.as_bytes()).unwrap();
    encoder.finish().unwrap();
    paths.push(bz2);

    #[cfg(feature = "lzma")]
    for name in ["abc.txt.xz", "abc.txt.lzma"] {
        let path = dir.join(name);
        let mut encoder = liblzma::write::XzEncoder::new(File::create(&path).unwrap(), 6);
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();
        paths.push(path);
    }

    #[cfg(feature = "zstd")]
    {
        let path = dir.join("abc.txt.zst");
        let mut encoder = zstd::stream::write::Encoder::new(File::create(&path).unwrap(), 3).unwrap();
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();
        paths.push(path);
    }

    paths
}

fn compressed_extensions() -> Vec<&'static str> {
    let mut extensions = vec![".gz", ".bz2"];
    if compfile::HAS_LZMA {
        extensions.extend([".xz", ".lzma"]);
    }
    if compfile::HAS_ZSTD {
        extensions.push(".zst");
    }
    extensions
}

#[test]
fn fixtures_read_identically_in_every_mode() {
    let dir = tempfile::tempdir().unwrap();

    for path in write_fixtures(dir.path()) {
        for mode in ["r", "rt", "rb", "R"] {
            let content = with_open(&path, mode, |file| file.read(None))
                .unwrap_or_else(|e| panic!("{} ({}): {}", path.display(), mode, e));
            let text = content.to_string_lossy();
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines, vec!["abc", "def"], "{} ({})", path.display(), mode);
            assert_eq!(content.is_binary(), mode == "rb", "{} ({})", path.display(), mode);
        }
    }
}

#[test]
fn text_mode_yields_strings_binary_mode_yields_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.txt.gz");
    with_open(&path, "w", |file| file.write(SAMPLE)).unwrap();

    let mut text = compfile::open(&path, "r").unwrap();
    assert_eq!(text.readline(None).unwrap(), Content::from("abc\n"));

    let mut binary = compfile::open(&path, "rb").unwrap();
    assert_eq!(binary.readline(None).unwrap(), Content::from(b"abc\n"));
}

#[test]
fn text_mode_sizes_count_characters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accents.txt.gz");
    with_open(&path, "w", |file| file.write("ééé\n")).unwrap();

    let mut file = compfile::open(&path, "r").unwrap();
    assert_eq!(file.read(Some(2)).unwrap(), "éé");
    assert_eq!(file.read(None).unwrap(), "é\n");

    let mut file = compfile::open(&path, "r").unwrap();
    assert_eq!(file.readline(Some(2)).unwrap(), "éé");
    assert_eq!(file.readline(None).unwrap(), "é\n");
}

#[test]
fn text_mode_reads_windows_line_endings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dos.txt.gz");
    with_open(&path, "wb", |file| file.write(b"abc\r\ndef\r\n")).unwrap();

    let lines = with_open(&path, "r", |file| file.readlines(None)).unwrap();
    assert_eq!(lines, vec![Content::from("abc\n"), Content::from("def\n")]);

    let raw = with_open(&path, "rb", |file| file.readline(None)).unwrap();
    assert_eq!(raw, Content::from(b"abc\r\n"));
}

#[test]
fn unmatched_extension_reads_raw_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let gz = dir.path().join("payload.gz");
    with_open(&gz, "w", |file| file.write(SAMPLE)).unwrap();

    // Same bytes under a name no predicate recognises
    let disguised = dir.path().join("payload.bin");
    std::fs::copy(&gz, &disguised).unwrap();

    let raw = with_open(&disguised, "rb", |file| file.read(None)).unwrap();
    assert_eq!(raw.into_bytes(), std::fs::read(&gz).unwrap());
}

#[test]
fn append_adds_to_compressed_files() {
    let dir = tempfile::tempdir().unwrap();

    for ext in compressed_extensions() {
        let path = dir.path().join(format!("journal{}", ext));
        with_open(&path, "w", |file| file.write("one\n")).unwrap();
        with_open(&path, "a", |file| file.write("two\n")).unwrap();

        let lines = with_open(&path, "r", |file| file.readlines(None)).unwrap();
        assert_eq!(
            lines,
            vec![Content::from("one\n"), Content::from("two\n")],
            "{}",
            ext
        );
    }
}

#[test]
fn exclusive_create_refuses_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("once.txt.bz2");

    with_open(&path, "x", |file| file.write("first\n")).unwrap();
    let err = compfile::open(&path, "x").unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::AlreadyExists));
}

#[test]
fn seek_and_tell_on_compressed_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("digits.txt.gz");
    with_open(&path, "wb", |file| file.write(b"0123456789")).unwrap();

    let mut file = compfile::open(&path, "rb").unwrap();
    assert!(file.seekable().unwrap());
    assert_eq!(file.seek(SeekFrom::Start(4)).unwrap(), 4);
    assert_eq!(file.read(Some(3)).unwrap(), Content::from(b"456"));
    assert_eq!(file.tell().unwrap(), 7);
    assert_eq!(file.seek(SeekFrom::Start(0)).unwrap(), 0);
    assert_eq!(file.read(Some(1)).unwrap(), Content::from(b"0"));
    assert_eq!(file.seek(SeekFrom::End(-1)).unwrap(), 9);
    assert_eq!(file.read(None).unwrap(), Content::from(b"9"));
}

#[test]
fn compressed_writers_cannot_seek() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.gz");

    let mut file = compfile::open(&path, "wb").unwrap();
    assert!(!file.seekable().unwrap());
    assert!(file.writable().unwrap());
    assert!(!file.readable().unwrap());

    let err = file.seek(SeekFrom::Start(0)).unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::Unsupported));

    let err = file.read(None).unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::Unsupported));
}

#[test]
fn close_is_idempotent_and_final() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closing.txt.gz");

    let mut file = compfile::open(&path, "w").unwrap();
    file.write("data\n").unwrap();
    file.close().unwrap();
    file.close().unwrap();

    assert!(file.closed());
    assert!(matches!(file.write("more"), Err(CompFileError::Closed)));
    assert!(matches!(file.flush(), Err(CompFileError::Closed)));
    assert!(matches!(file.peek(1), Err(CompFileError::Closed)));

    assert_eq!(
        with_open(&path, "r", |file| file.read(None)).unwrap(),
        "data\n"
    );
}

#[test]
fn dropping_a_writer_finishes_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dropped.txt.bz2");

    {
        let mut file = compfile::open(&path, "w").unwrap();
        file.write("kept on drop\n").unwrap();
    }

    assert_eq!(
        with_open(&path, "r", |file| file.read(None)).unwrap(),
        "kept on drop\n"
    );
}

#[test]
fn compression_level_is_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let data = "compressible line of text\n".repeat(2000);

    let fast = dir.path().join("fast.gz");
    let best = dir.path().join("best.gz");
    for (path, level) in [(&fast, 0), (&best, 9)] {
        let opener = Opener::new().options(EngineOptions::default().with_level("gzip", level));
        opener.scoped(path, "w", |file| file.write(data.as_str())).unwrap();
    }

    let fast_size = std::fs::metadata(&fast).unwrap().len();
    let best_size = std::fs::metadata(&best).unwrap().len();
    assert!(best_size < fast_size);
    assert_eq!(with_open(&fast, "r", |f| f.read(None)).unwrap(), data.as_str());
}

/// Toy codec that flips every bit; enough to exercise the extension point
struct InvertCodec;

struct Inverting<T>(T);

impl<R: Read> Read for Inverting<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.0.read(buf)?;
        buf[..n].iter_mut().for_each(|b| *b = !*b);
        Ok(n)
    }
}

impl<W: Write> Write for Inverting<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inverted: Vec<u8> = buf.iter().map(|b| !b).collect();
        self.0.write_all(&inverted)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl FinishWrite for Inverting<File> {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

impl compfile::Codec for InvertCodec {
    fn name(&self) -> &str {
        "invert"
    }

    fn wrap_reader(&self, file: File) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Inverting(file)))
    }

    fn wrap_writer(&self, file: File, _options: &EngineOptions) -> io::Result<Box<dyn FinishWrite>> {
        Ok(Box::new(Inverting(file)))
    }
}

#[test]
fn custom_engine_through_custom_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secret.inv");

    let registry = Registry::with_builtins();
    registry
        .register_globs(&["*.inv"], Engine::custom(InvertCodec), DEFAULT_PRIORITY, false)
        .unwrap();
    assert!(registry.is_compressed(&path));
    assert!(!compfile::is_compressed(&path));

    let opener = Opener::with_registry(&registry);
    opener.scoped(&path, "w", |file| file.write("hidden\n")).unwrap();

    let raw = std::fs::read(&path).unwrap();
    assert_eq!(raw[0], !b'h');

    let mut file = opener.open(&path, "r").unwrap();
    assert_eq!(file.engine().name(), "invert");
    assert_eq!(file.read(None).unwrap(), "hidden\n");
}

#[test]
fn higher_priority_predicate_overrides_builtin() {
    let registry = Registry::with_builtins();
    registry.register(
        |path: &Path| {
            path.to_str()
                .filter(|p| p.ends_with(".gz"))
                .map(|_| Engine::plain())
        },
        10,
        false,
    );
    assert_eq!(registry.resolve("archive.gz"), Some(Engine::plain()));
    assert_eq!(registry.resolve("archive.bz2"), Some(Engine::bzip2()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn binary_content_survives_every_engine(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let dir = tempfile::tempdir().unwrap();
        for ext in compressed_extensions() {
            let path = dir.path().join(format!("blob{}", ext));
            with_open(&path, "wb", |file| file.write(data.clone())).unwrap();
            let back = with_open(&path, "rb", |file| file.read(None)).unwrap();
            prop_assert_eq!(back.into_bytes(), data.clone(), "{}", ext);
        }
    }

    #[test]
    fn text_content_survives_every_engine(text in "\\PC{0,512}") {
        let dir = tempfile::tempdir().unwrap();
        for ext in compressed_extensions() {
            let path = dir.path().join(format!("notes{}", ext));
            with_open(&path, "w", |file| file.write(text.as_str())).unwrap();
            let back = with_open(&path, "r", |file| file.read(None)).unwrap();
            prop_assert_eq!(back.into_text(), Some(text.clone()), "{}", ext);
        }
    }
}
