//! `@generated` headers for emitted files.

use sha2::{Digest, Sha256};

/// One input a generated file was produced from.
#[derive(Debug, Clone, Copy)]
pub struct SourceInput<'a> {
    /// Display name, usually the file name.
    pub name: &'a str,
    pub text: &'a str,
}

/// SHA-256 hex digest over the input texts, in order.
pub fn input_digest(inputs: &[SourceInput<'_>]) -> String {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input.text.as_bytes());
        // separator so that ["ab", "c"] and ["a", "bc"] differ
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Builds a two-line header naming the tool and inputs, with a short digest.
///
/// # Examples
///
/// ```
/// use asdl_schema_emit::{SourceInput, generated_header};
///
/// let header = generated_header("#", "asdlgen", &[SourceInput { name: "a.asdl", text: "module A {}" }]);
/// assert!(header.starts_with("# @generated by asdlgen from a.asdl\n# input-digest: sha256:"));
/// ```
pub fn generated_header(comment: &str, tool: &str, inputs: &[SourceInput<'_>]) -> String {
    let names: Vec<&str> = inputs.iter().map(|input| input.name).collect();
    let digest = input_digest(inputs);
    let mut out = String::new();
    out.push_str(&format!(
        "{comment} @generated by {tool} from {}\n",
        names.join(", ")
    ));
    out.push_str(&format!("{comment} input-digest: sha256:{}\n", &digest[..16]));
    out
}
