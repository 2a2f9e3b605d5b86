use crate::config::LayerConfig;
use crate::types::ArchitecturalLayer;

/// Resolves file paths to architectural layers by path prefix.
pub struct LayerClassifier {
    /// Sorted by ascending rank.
    layers: Vec<ArchitecturalLayer>,
}

impl LayerClassifier {
    pub fn new(configs: &[LayerConfig]) -> Self {
        let mut layers: Vec<ArchitecturalLayer> = configs
            .iter()
            .map(|c| ArchitecturalLayer {
                rank: c.rank,
                name: c.name.clone(),
                path_prefix: c.prefix.replace('\\', "/"),
            })
            .collect();
        layers.sort_by_key(|l| l.rank);
        Self { layers }
    }

    /// Classify a path into the layer with the longest matching prefix.
    /// Ties go to the lower rank.
    pub fn classify(&self, path: &str) -> Option<&ArchitecturalLayer> {
        let normalized = path.replace('\\', "/");
        let mut best: Option<&ArchitecturalLayer> = None;
        for layer in &self.layers {
            if !normalized.starts_with(&layer.path_prefix) {
                continue;
            }
            match best {
                Some(b) if b.path_prefix.len() >= layer.path_prefix.len() => {}
                _ => best = Some(layer),
            }
        }
        best
    }

    pub fn layers(&self) -> &[ArchitecturalLayer] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &str, rank: u32, prefix: &str) -> LayerConfig {
        LayerConfig {
            name: name.to_string(),
            rank,
            prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_classify_default_layers() {
        let classifier = LayerClassifier::new(&crate::config::Config::default().layers);

        assert_eq!(
            classifier.classify("src/shared/ui/Button.vue").map(|l| l.name.as_str()),
            Some("shared")
        );
        assert_eq!(
            classifier.classify("src/pages/home/ui/HomePage.vue").map(|l| l.rank),
            Some(4)
        );
        assert_eq!(
            classifier.classify("src/app/main.js").map(|l| l.name.as_str()),
            Some("app")
        );
        assert!(classifier.classify("src/main.js").is_none());
        assert!(classifier.classify("public/data/menu.json").is_none());
    }

    #[test]
    fn test_layers_sorted_by_rank() {
        let classifier = LayerClassifier::new(&[
            layer("app", 2, "src/app/"),
            layer("shared", 0, "src/shared/"),
            layer("features", 1, "src/features/"),
        ]);
        let names: Vec<_> = classifier.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["shared", "features", "app"]);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let classifier = LayerClassifier::new(&[
            layer("app", 3, "src/"),
            layer("shared", 0, "src/shared/"),
        ]);
        assert_eq!(
            classifier.classify("src/shared/lib/a.js").map(|l| l.name.as_str()),
            Some("shared")
        );
        assert_eq!(
            classifier.classify("src/other/a.js").map(|l| l.name.as_str()),
            Some("app")
        );
    }

    #[test]
    fn test_equal_prefix_prefers_lower_rank() {
        let classifier = LayerClassifier::new(&[
            layer("high", 5, "src/x/"),
            layer("low", 1, "src/x/"),
        ]);
        assert_eq!(
            classifier.classify("src/x/a.js").map(|l| l.name.as_str()),
            Some("low")
        );
    }
}
