use crate::parse;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use trustgate_domain::artifact::{ArtifactError, ArtifactSource};
use trustgate_domain::model::MeasurementReport;
use trustgate_settings::{ArtifactLocation, default_artifact};
use trustgate_types::GateKind;

/// Reads gate reports from the repository on every call; nothing is cached.
#[derive(Clone, Debug)]
pub struct FsArtifactSource {
    root: Utf8PathBuf,
    /// Workspace directories relative to `root`, probed after the root itself.
    workspaces: Vec<Utf8PathBuf>,
    locations: BTreeMap<GateKind, ArtifactLocation>,
}

impl FsArtifactSource {
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        workspaces: Vec<Utf8PathBuf>,
        locations: BTreeMap<GateKind, ArtifactLocation>,
    ) -> Self {
        Self {
            root: root.into(),
            workspaces,
            locations,
        }
    }

    fn location(&self, gate: GateKind) -> ArtifactLocation {
        self.locations
            .get(&gate)
            .cloned()
            .unwrap_or_else(|| default_artifact(gate))
    }

    /// Every path probed for `gate`, in probe order.
    pub fn candidates(&self, gate: GateKind) -> Vec<Utf8PathBuf> {
        let rel = self.location(gate).path;
        std::iter::once(self.root.join(&rel))
            .chain(self.workspaces.iter().map(|ws| self.root.join(ws).join(&rel)))
            .collect()
    }
}

impl ArtifactSource for FsArtifactSource {
    fn load(&self, gate: GateKind) -> Result<MeasurementReport, ArtifactError> {
        let candidates = self.candidates(gate);
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Err(ArtifactError::Missing {
                gate,
                searched: candidates.iter().map(|p| p.to_string()).collect(),
                command: self.location(gate).command,
            });
        };

        tracing::debug!(gate = %gate, path = %path, "reading artifact");
        let text = std::fs::read_to_string(path).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        normalize(gate, path, &text)
    }
}

fn normalize(gate: GateKind, path: &Utf8Path, text: &str) -> Result<MeasurementReport, ArtifactError> {
    let parsed = match gate {
        GateKind::Coverage => parse::parse_istanbul(text).map(MeasurementReport::Coverage),
        GateKind::Mutation => parse::parse_stryker(text).map(MeasurementReport::Mutation),
        GateKind::Contracts => parse::parse_contracts(text).map(MeasurementReport::Contracts),
    };
    parsed.map_err(|e| ArtifactError::Parse {
        path: path.to_string(),
        reason: format!("{e:#}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    #[test]
    fn missing_report_lists_every_probe() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let source = FsArtifactSource::new(
            root.clone(),
            vec![Utf8PathBuf::from("packages/a")],
            BTreeMap::new(),
        );

        let err = source.load(GateKind::Mutation).unwrap_err();
        let ArtifactError::Missing {
            searched, command, ..
        } = err
        else {
            panic!("expected missing artifact");
        };
        assert_eq!(
            searched,
            vec![
                root.join("reports/mutation/mutation.json").to_string(),
                root.join("packages/a/reports/mutation/mutation.json").to_string(),
            ]
        );
        assert_eq!(command.as_deref(), Some("npx stryker run"));
    }

    #[test]
    fn root_report_wins_over_workspace_report() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(
            &root.join("test-results/contract-results.json"),
            r#"{"numPassed": 3, "numTotal": 3}"#,
        );
        write_file(
            &root.join("packages/a/test-results/contract-results.json"),
            r#"{"numPassed": 0, "numTotal": 3}"#,
        );
        let source = FsArtifactSource::new(
            root,
            vec![Utf8PathBuf::from("packages/a")],
            BTreeMap::new(),
        );

        let Ok(MeasurementReport::Contracts(m)) = source.load(GateKind::Contracts) else {
            panic!("expected contract metrics");
        };
        assert_eq!(m.num_passed, 3);
    }

    #[test]
    fn malformed_report_is_a_parse_error_naming_the_file() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("out/cov.json"), "{ truncated");
        let locations = BTreeMap::from([(
            GateKind::Coverage,
            ArtifactLocation {
                path: "out/cov.json".to_string(),
                command: None,
            },
        )]);
        let source = FsArtifactSource::new(root.clone(), Vec::new(), locations);

        match source.load(GateKind::Coverage) {
            Err(ArtifactError::Parse { path, .. }) => {
                assert_eq!(path, root.join("out/cov.json").to_string())
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
