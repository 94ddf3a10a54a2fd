use vesper_nighthawk::{PluginManifest, ProviderRegistry, EXTENSION_POINT};

/// Print the bundled manifest and check it against this build and, if
/// given, a host version.
pub fn run(host_version: Option<&str>) -> eyre::Result<String> {
    let manifest = PluginManifest::bundled()?;
    manifest.check_matches_crate()?;

    let registry = ProviderRegistry::with_builtin();
    match host_version {
        Some(version) => manifest.validate(&registry, version)?,
        None => {
            registry.discover(&manifest)?;
            tracing::warn!("No host version given -- version requirement not checked");
        }
    }

    let mut out = serde_json::to_string_pretty(&manifest)?;
    for entry in manifest.entry_points(EXTENSION_POINT) {
        out.push_str(&format!(
            "\n[manifest] {EXTENSION_POINT}: {} -> {} (resolved)",
            entry.name, entry.unit
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_manifest_reports_entry_point() {
        let out = run(Some("0.4.20")).unwrap();
        assert!(out.contains("\"name\": \"vesper-nighthawk\""));
        assert!(out.contains("vesper.detector_providers: vesper_nighthawk -> vesper_nighthawk"));
    }

    #[test]
    fn unsupported_host_fails() {
        assert!(run(Some("1.0.0")).is_err());
        assert!(run(None).is_ok());
    }
}
