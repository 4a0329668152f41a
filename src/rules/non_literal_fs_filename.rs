//! Rule: detect `fs` calls whose path arguments are not static.
//!
//! Every `fs` function that takes a filename (or two, for the copy/link/
//! rename family) is checked at the argument positions that name files.
//! Arguments proven static by the evaluator are accepted.

use super::{Rule, RuleContext};
use crate::ast::{NodeId, NodeKind};
use crate::types::{Finding, FindingCategory, Severity};

const FS_PACKAGE_NAMES: &[&str] = &["fs", "node:fs", "fs/promises", "node:fs/promises"];

/// Argument indices that name files for each `fs` function. Functions not
/// listed here take no filename and are never reported.
fn risky_indices(function: &str) -> &'static [usize] {
    match function {
        "access" | "accessSync" => &[0],
        "appendFile" | "appendFileSync" => &[0],
        "chmod" | "chmodSync" => &[0],
        "chown" | "chownSync" => &[0],
        "copyFile" | "copyFileSync" => &[0, 1],
        "cp" | "cpSync" => &[0, 1],
        "createReadStream" => &[0],
        "createWriteStream" => &[0],
        "exists" | "existsSync" => &[0],
        "lchmod" | "lchmodSync" => &[0],
        "lchown" | "lchownSync" => &[0],
        "link" | "linkSync" => &[0, 1],
        "lstat" | "lstatSync" => &[0],
        "lutimes" | "lutimesSync" => &[0],
        "mkdir" | "mkdirSync" => &[0],
        "mkdtemp" | "mkdtempSync" => &[0],
        "open" | "openSync" => &[0],
        "opendir" | "opendirSync" => &[0],
        "readdir" | "readdirSync" => &[0],
        "readFile" | "readFileSync" => &[0],
        "readlink" | "readlinkSync" => &[0],
        "realpath" | "realpathSync" => &[0],
        "rename" | "renameSync" => &[0, 1],
        "rm" | "rmSync" => &[0],
        "rmdir" | "rmdirSync" => &[0],
        "stat" | "statSync" => &[0],
        "symlink" | "symlinkSync" => &[0, 1],
        "truncate" | "truncateSync" => &[0],
        "unlink" | "unlinkSync" => &[0],
        "unwatchFile" => &[0],
        "utimes" | "utimesSync" => &[0],
        "watch" => &[0],
        "watchFile" => &[0],
        "writeFile" | "writeFileSync" => &[0],
        _ => &[],
    }
}

pub struct NonLiteralFsFilenameRule;

impl NonLiteralFsFilenameRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NonLiteralFsFilenameRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NonLiteralFsFilenameRule {
    fn id(&self) -> &'static str {
        "detect-non-literal-fs-filename"
    }

    fn title(&self) -> &'static str {
        "Non-literal fs filename"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn category(&self) -> FindingCategory {
        FindingCategory::PathTraversal
    }

    fn handles(&self, kind: &NodeKind) -> bool {
        matches!(kind, NodeKind::CallExpression { .. })
    }

    fn check(&self, cx: &RuleContext, node: NodeId) -> Vec<Finding> {
        let NodeKind::CallExpression { callee, arguments } = cx.ast().kind(node) else {
            return Vec::new();
        };
        let Some(info) = cx.access_path(*callee, FS_PACKAGE_NAMES) else {
            return Vec::new();
        };

        // Either `fs.readFile` or `fs.promises.readFile`.
        let function = match info.path.as_slice() {
            [function] => function.as_str(),
            [head, function] if head == "promises" => function.as_str(),
            _ => return Vec::new(),
        };

        let mut findings = Vec::new();
        for &index in risky_indices(function) {
            let Some(arg) = arguments.get(index) else {
                continue;
            };
            if matches!(cx.ast().kind(*arg), NodeKind::SpreadElement { .. }) || !cx.is_static(*arg)
            {
                findings.push(
                    Finding::new(
                        self.id(),
                        self.title(),
                        format!("Found fs.{} with non literal argument at index {}", function, index),
                        self.severity(),
                        self.category(),
                        cx.location(node),
                        cx.snippet(node),
                    )
                    .with_remediation(
                        "Resolve the path against a fixed base directory and validate it before handing it to fs.",
                    )
                    .with_metadata("package", info.package_name.clone())
                    .with_metadata("function", function.to_string()),
                );
            }
        }
        findings
    }
}
