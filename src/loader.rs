use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Reads a raw ROM image. The image must be non-empty and fit in `limit` bytes.
pub fn read_rom(path: &Path, limit: usize) -> Result<Vec<u8>> {
    let rom = fs::read(path).with_context(|| format!("reading ROM {}", path.display()))?;
    if rom.is_empty() {
        bail!("ROM {} is empty", path.display());
    }
    if rom.len() > limit {
        bail!(
            "ROM {} is {} bytes, larger than the {} byte address space",
            path.display(),
            rom.len(),
            limit
        );
    }
    tracing::debug!("read {} bytes from {}", rom.len(), path.display());
    Ok(rom)
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::path::PathBuf;

    use super::*;

    fn temp_rom(name: &str, contents: &[u8]) -> PathBuf {
        let path = env::temp_dir().join(format!("romstep-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_bytes() {
        let path = temp_rom("ok.bin", &[0xEA, 0x00, 0x00]);
        assert_eq!(read_rom(&path, 0x10000).unwrap(), vec![0xEA, 0x00, 0x00]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_empty() {
        let path = temp_rom("empty.bin", &[]);
        let err = read_rom(&path, 0x10000).unwrap_err();
        assert!(err.to_string().contains("empty"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_oversized() {
        let path = temp_rom("big.bin", &[0; 17]);
        let err = read_rom(&path, 16).unwrap_err();
        assert!(err.to_string().contains("larger than"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_names_path() {
        let path = env::temp_dir().join("romstep-does-not-exist.bin");
        let err = read_rom(&path, 0x10000).unwrap_err();
        assert!(format!("{:#}", err).contains("romstep-does-not-exist.bin"));
    }
}
