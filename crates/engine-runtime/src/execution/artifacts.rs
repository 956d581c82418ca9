use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Format of the generation timestamp embedded in artifact names.
pub const GENERATED_AT_FORMAT: &str = "%Y%m%d_%H%M";

/// Output locations for one run: `<prefix>_<day>_<generated>.csv` and
/// `<prefix>_<day>_<generated>.tar.gz`, side by side in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub csv: PathBuf,
    pub archive: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, prefix: &str, day: NaiveDate, generated_at: NaiveDateTime) -> Self {
        let base = format!(
            "{prefix}_{}_{}",
            day.format("%Y-%m-%d"),
            generated_at.format(GENERATED_AT_FORMAT)
        );
        ArtifactPaths {
            csv: dir.join(format!("{base}.csv")),
            archive: dir.join(format!("{base}.tar.gz")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let day = NaiveDate::from_ymd_opt(2025, 12, 7).unwrap();
        let generated_at = NaiveDate::from_ymd_opt(2025, 12, 8)
            .unwrap()
            .and_hms_opt(1, 5, 59)
            .unwrap();

        let paths = ArtifactPaths::new(Path::new("/var/tmp"), "orders", day, generated_at);

        assert_eq!(
            paths.csv,
            PathBuf::from("/var/tmp/orders_2025-12-07_20251208_0105.csv")
        );
        assert_eq!(
            paths.archive,
            PathBuf::from("/var/tmp/orders_2025-12-07_20251208_0105.tar.gz")
        );
        assert_eq!(paths.csv.parent(), paths.archive.parent());
    }
}
