use fmea_rag::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// CT scanner FMEA sheet with an extra column the loader must ignore.
pub const CT_SCANNER_SHEET: &str = "\
Item/Function,Failure Mode,Effects of Failure,Potential Cause(s),Recommended Actions,Severity
Gantry Motor,bearing seizure,Rotation stops and the scan is aborted,Lubricant degradation after extended duty cycles,Vibration monitoring and scheduled bearing replacement,8
X-ray Tube,anode cracking,No radiation output,Thermal overload during long helical acquisitions,Enforce cooling intervals between acquisitions,9
Detector Array,pixel drift,Ring artifacts in reconstructed images,Temperature fluctuation in the detector housing,Daily air calibration,6
Patient Table,positioning error,Misregistered slices,Encoder wear,Position encoder verification at startup,7
High Voltage Generator,arcing,Image noise and exposure interruption,Insulating oil contamination,Oil dielectric testing,8
";

pub const HEADER_ONLY_SHEET: &str =
    "Item/Function,Failure Mode,Effects of Failure,Potential Cause(s),Recommended Actions\n";

/// Scratch directory holding knowledge and settings files.
pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Default settings with the offline hashing embedder and the given sheet.
pub fn hash_settings(knowledge: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.embedding.model = "hash".to_string();
    settings.knowledge.path = knowledge.to_path_buf();
    settings
}

/// Workspace with the CT scanner sheet, plus matching settings.
pub fn ct_scanner() -> (TestWorkspace, Settings) {
    let workspace = TestWorkspace::new();
    let csv = workspace.add_file("fmea_example.csv", CT_SCANNER_SHEET);
    let settings = hash_settings(&csv);
    (workspace, settings)
}
