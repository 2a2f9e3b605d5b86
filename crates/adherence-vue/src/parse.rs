use tree_sitter::{Language, Node, Parser, Tree, TreeCursor};

/// Deepest syntax nesting a script may have. Lowering and extraction
/// recurse on the tree, so anything deeper is reported unparseable.
pub const MAX_NESTING: usize = 512;

/// How much syntax damage a parse may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tolerance {
    /// Any error or missing node fails the parse.
    Strict,
    /// Fails only when error regions cover more than half of the source.
    Permissive,
}

/// Parses script text with the TypeScript grammars. TypeScript is a
/// superset of the JavaScript these files are written in.
pub struct ScriptParser {
    ts_language: Language,
    tsx_language: Language,
}

impl ScriptParser {
    pub fn new() -> Self {
        Self {
            ts_language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx_language: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    /// Primary parse: TypeScript grammar, no errors tolerated.
    pub fn parse_strict(&self, source: &str) -> Result<Tree, String> {
        self.parse(source, &self.ts_language, Tolerance::Strict)
    }

    /// Fallback parse: TSX grammar, partial damage tolerated.
    pub fn parse_permissive(&self, source: &str) -> Result<Tree, String> {
        self.parse(source, &self.tsx_language, Tolerance::Permissive)
    }

    fn parse(&self, source: &str, language: &Language, tolerance: Tolerance) -> Result<Tree, String> {
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| format!("failed to load grammar: {e}"))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| "parser produced no tree".to_string())?;

        let root = tree.root_node();
        if deeper_than(root, MAX_NESTING) {
            return Err(format!("nesting deeper than {MAX_NESTING} levels"));
        }
        match tolerance {
            Tolerance::Strict => {
                if root.has_error() {
                    let at = first_error(root)
                        .map(|n| {
                            let p = n.start_position();
                            format!(" at line {}, column {}", p.row + 1, p.column + 1)
                        })
                        .unwrap_or_default();
                    return Err(format!("syntax error{at}"));
                }
            }
            Tolerance::Permissive => {
                if root.is_error() {
                    return Err("unrecoverable syntax".to_string());
                }
                let significant = source.trim().len();
                let damaged = error_bytes(root);
                if significant > 0 && damaged * 2 > significant {
                    return Err(format!(
                        "syntax errors cover {damaged} of {significant} bytes"
                    ));
                }
            }
        }
        Ok(tree)
    }
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        if !next_sibling_or_ancestor(&mut cursor) {
            return None;
        }
    }
}

/// Bytes covered by error and missing nodes.
fn error_bytes(root: Node<'_>) -> usize {
    let mut cursor = root.walk();
    let mut total = 0;
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            total += node.byte_range().len();
        } else if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        if !next_sibling_or_ancestor(&mut cursor) {
            return total;
        }
    }
}

/// Whether any node sits more than `limit` levels below `root`.
fn deeper_than(root: Node<'_>, limit: usize) -> bool {
    let mut cursor = root.walk();
    let mut depth = 0;
    loop {
        if depth > limit {
            return true;
        }
        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return false;
            }
            depth -= 1;
        }
    }
}

/// Move to the next node in pre-order that is not below the current one.
/// Returns false once the walk is back at the root.
fn next_sibling_or_ancestor(cursor: &mut TreeCursor<'_>) -> bool {
    loop {
        if cursor.goto_next_sibling() {
            return true;
        }
        if !cursor.goto_parent() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_accepts_valid_script() {
        let parser = ScriptParser::new();
        assert!(parser
            .parse_strict("import { ref } from 'vue'\nconst a = ref(1)\n")
            .is_ok());
    }

    #[test]
    fn test_strict_rejects_damage() {
        let parser = ScriptParser::new();
        let err = parser.parse_strict("const a = ;\nconst b = 2\n").unwrap_err();
        assert!(err.starts_with("syntax error"));
    }

    #[test]
    fn test_permissive_tolerates_small_damage() {
        let parser = ScriptParser::new();
        let source = "import A from './A.vue'\nimport B from './B.vue'\nconst routes = [{ path: '/a', component: A }]\nconst x = ;\n";
        assert!(parser.parse_strict(source).is_err());
        assert!(parser.parse_permissive(source).is_ok());
    }

    #[test]
    fn test_permissive_rejects_garbage() {
        let parser = ScriptParser::new();
        assert!(parser.parse_permissive("}}}}}}}}}}").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parser = ScriptParser::new();
        let deep = format!("export const x = {}1{};", "[".repeat(3000), "]".repeat(3000));
        assert_eq!(
            parser.parse_strict(&deep).unwrap_err(),
            format!("nesting deeper than {MAX_NESTING} levels")
        );
        assert!(parser.parse_permissive(&deep).is_err());

        let shallow = format!("export const x = {}1{};", "[".repeat(50), "]".repeat(50));
        assert!(parser.parse_strict(&shallow).is_ok());
    }

    #[test]
    fn test_empty_source_parses() {
        let parser = ScriptParser::new();
        assert!(parser.parse_strict("").is_ok());
        assert!(parser.parse_permissive("   \n").is_ok());
    }
}
