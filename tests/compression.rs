#[cfg(any(feature = "compression-gzip", feature = "compression-zstd"))]
mod compression_tests {
    use anyhow::Result;
    use keysplit::io::compression::{detect_codec, open_input};
    use keysplit::testing::FixtureBuilder;
    use keysplit::{CacheMode, ImportConfig, Importer};
    use std::io::{Read, Write};
    use std::path::Path;

    fn fixture() -> FixtureBuilder {
        FixtureBuilder::new()
            .unique(40)
            .duplicated(5, 2)
            .missing_last_page(3)
    }

    fn plain_bytes(fixture: &FixtureBuilder) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        fixture.write_to(&mut buf)?;
        Ok(buf)
    }

    fn import(input: &Path, out: &Path) -> Result<keysplit::Summary> {
        let config = ImportConfig {
            output_dir: out.to_path_buf(),
            cache_path: out.join("cache"),
            ..ImportConfig::new(input, CacheMode::Memory)
        };
        Importer::new(config)?.run()
    }

    #[cfg(feature = "compression-gzip")]
    fn gzip(data: &[u8]) -> Result<Vec<u8>> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data)?;
        Ok(enc.finish()?)
    }

    #[test]
    fn plain_input_has_no_codec() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("plain.csv");
        let data = plain_bytes(&fixture())?;
        std::fs::write(&path, &data)?;

        assert_eq!(detect_codec(&path)?, None);
        let mut back = Vec::new();
        open_input(&path)?.read_to_end(&mut back)?;
        assert_eq!(back, data);
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_by_extension() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("fascicles.csv.gz");
        let fixture = fixture();
        std::fs::write(&path, gzip(&plain_bytes(&fixture)?)?)?;

        assert_eq!(detect_codec(&path)?, Some("gzip"));
        let summary = import(&path, tmp.path())?;
        assert_eq!(summary, fixture.expected(CacheMode::Memory));
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_by_magic_bytes() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        // No .gz suffix: detection falls back to the stream signature.
        let path = tmp.path().join("fascicles.csv");
        let fixture = fixture();
        std::fs::write(&path, gzip(&plain_bytes(&fixture)?)?)?;

        assert_eq!(detect_codec(&path)?, Some("gzip"));
        let summary = import(&path, tmp.path())?;
        assert_eq!(summary, fixture.expected(CacheMode::Memory));
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn concatenated_gzip_members() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("parts.csv.gz");
        let mut data = gzip(b"Chave Natural,First Page,Last Page\r\na,1,2\r\n")?;
        data.extend(gzip(b"b,,2\r\na,3,4\r\n")?);
        std::fs::write(&path, data)?;

        let summary = import(&path, tmp.path())?;
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.duplicated_key_rows, 1);
        assert_eq!(summary.missing_boundary_rows, 1);
        Ok(())
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_input() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("fascicles.csv.zst");
        let fixture = fixture();
        let compressed = zstd::encode_all(plain_bytes(&fixture)?.as_slice(), 0)?;
        std::fs::write(&path, compressed)?;

        assert_eq!(detect_codec(&path)?, Some("zstd"));
        let summary = import(&path, tmp.path())?;
        assert_eq!(summary, fixture.expected(CacheMode::Memory));
        Ok(())
    }
}
