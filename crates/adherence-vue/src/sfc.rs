use std::ops::Range;

use anyhow::{Context, Result};
use regex::Regex;

/// The parts of a single-file component the analyzer needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SfcBlocks {
    /// Contents of every `<script>` block, joined with newlines.
    pub script: String,
    /// Element tags of the `<template>` block with their byte spans in the file.
    pub template_tags: Vec<(String, Range<usize>)>,
}

/// Splits `.vue` files into script and template blocks.
pub struct SfcSplitter {
    script_open: Regex,
    script_block: Regex,
    script_lenient: Regex,
    template_open: Regex,
    template_close: Regex,
    comment: Regex,
    tag: Regex,
}

impl SfcSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            script_open: Regex::new(r"(?i)<script(?:\s[^>]*)?>").context("script open pattern")?,
            script_block: Regex::new(r"(?is)<script(?:\s[^>]*)?>(.*?)</script\s*>")
                .context("script block pattern")?,
            script_lenient: Regex::new(r"(?is)<script(?:\s[^>]*)?>(.*?)(?:</script\s*>|\z)")
                .context("lenient script pattern")?,
            template_open: Regex::new(r"(?i)<template(?:\s[^>]*)?>").context("template pattern")?,
            template_close: Regex::new(r"(?i)</template\s*>").context("template pattern")?,
            comment: Regex::new(r"(?s)<!--.*?-->").context("comment pattern")?,
            // Quoted attribute values are matched as a whole so markup inside them is skipped.
            tag: Regex::new(r#"<([A-Za-z][A-Za-z0-9_.:-]*)|=\s*(?:"[^"]*"|'[^']*')"#)
                .context("tag pattern")?,
        })
    }

    /// Split a component, failing on unclosed `<script>` or `<template>` blocks.
    pub fn split(&self, source: &str) -> std::result::Result<SfcBlocks, String> {
        let opened = self.script_open.find_iter(source).count();
        let blocks: Vec<&str> = self
            .script_block
            .captures_iter(source)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        if opened != blocks.len() {
            return Err("unclosed <script> block".to_string());
        }

        let template_tags = match self.template_open.find(source) {
            Some(open) => {
                let close = self
                    .template_close
                    .find_iter(&source[open.end()..])
                    .last()
                    .ok_or_else(|| "unclosed <template> block".to_string())?;
                let start = open.end();
                self.tags(&source[start..start + close.start()], start)
            }
            None => Vec::new(),
        };

        Ok(SfcBlocks {
            script: blocks.join("\n"),
            template_tags,
        })
    }

    /// Script content only, tolerating a missing closing tag.
    pub fn script_lenient(&self, source: &str) -> String {
        self.script_lenient
            .captures_iter(source)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn tags(&self, body: &str, offset: usize) -> Vec<(String, Range<usize>)> {
        let mut out = Vec::new();
        let mut cursor = 0;
        for comment in self.comment.find_iter(body) {
            self.collect_tags(&body[cursor..comment.start()], offset + cursor, &mut out);
            cursor = comment.end();
        }
        self.collect_tags(&body[cursor..], offset + cursor, &mut out);
        out
    }

    fn collect_tags(&self, text: &str, offset: usize, out: &mut Vec<(String, Range<usize>)>) {
        for caps in self.tag.captures_iter(text) {
            if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
                out.push((
                    name.as_str().to_string(),
                    offset + whole.start()..offset + whole.end(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_names(blocks: &SfcBlocks) -> Vec<&str> {
        blocks.template_tags.iter().map(|(t, _)| t.as_str()).collect()
    }

    #[test]
    fn test_split_component() {
        let splitter = SfcSplitter::new().unwrap();
        let source = "<template>\n  <div>\n    <!-- <Ghost /> -->\n    <MyButton @click=\"go\" />\n    <my-card></my-card>\n  </div>\n</template>\n\n<script setup>\nimport MyButton from './MyButton.vue'\n</script>\n";
        let blocks = splitter.split(source).unwrap();

        assert_eq!(blocks.script.trim(), "import MyButton from './MyButton.vue'");
        assert_eq!(tag_names(&blocks), vec!["div", "MyButton", "my-card"]);

        let (_, span) = &blocks.template_tags[1];
        assert_eq!(&source[span.clone()], "<MyButton");
    }

    #[test]
    fn test_split_joins_script_blocks() {
        let splitter = SfcSplitter::new().unwrap();
        let source = "<script>\nexport default {}\n</script>\n<script setup lang=\"ts\">\nconst a = 1\n</script>";
        let blocks = splitter.split(source).unwrap();
        assert!(blocks.script.contains("export default {}"));
        assert!(blocks.script.contains("const a = 1"));
        assert!(blocks.template_tags.is_empty());
    }

    #[test]
    fn test_nested_template_elements() {
        let splitter = SfcSplitter::new().unwrap();
        let source = "<template><ul><template v-if=\"x\"><li /></template></ul></template>";
        let blocks = splitter.split(source).unwrap();
        assert_eq!(tag_names(&blocks), vec!["ul", "template", "li"]);
    }

    #[test]
    fn test_hyphenated_tags_are_not_blocks() {
        let splitter = SfcSplitter::new().unwrap();
        let source = "<template>\n  <script-editor v-model=\"code\" />\n  <template-row></template-row>\n</template>\n<script setup>\nimport ScriptEditor from './ScriptEditor.vue'\n</script>\n";
        let blocks = splitter.split(source).unwrap();
        assert_eq!(blocks.script.trim(), "import ScriptEditor from './ScriptEditor.vue'");
        assert_eq!(tag_names(&blocks), vec!["script-editor", "template-row"]);
    }

    #[test]
    fn test_attribute_values_are_not_tags() {
        let splitter = SfcSplitter::new().unwrap();
        let source = "<template><div v-if=\"count<Max\" :title='a <B'><Max /></div></template>";
        let blocks = splitter.split(source).unwrap();
        assert_eq!(tag_names(&blocks), vec!["div", "Max"]);
    }

    #[test]
    fn test_unclosed_blocks_fail() {
        let splitter = SfcSplitter::new().unwrap();
        assert!(splitter.split("<script>\nconst a = 1\n").is_err());
        assert!(splitter.split("<template><div></div>\n<script></script>").is_err());
    }

    #[test]
    fn test_lenient_script_tolerates_unclosed() {
        let splitter = SfcSplitter::new().unwrap();
        let source = "<template><div>\n<script setup>\nimport A from './A.vue'\n";
        assert_eq!(
            splitter.script_lenient(source).trim(),
            "import A from './A.vue'"
        );
    }
}
