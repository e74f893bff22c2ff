//! Template files holding several field blocks.

use std::collections::HashSet;
use std::path::Path;

use super::error::TemplateError;
use super::field::FieldDescriptor;

/// A block that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedBlock {
    /// Position of the block in the file (0-based)
    pub index: usize,
    /// Line of the opening brace (1-based)
    pub line: usize,
    pub error: TemplateError,
}

/// The fields of a template file, in declaration order.
#[derive(Debug, Default)]
pub struct TemplateSet {
    fields: Vec<FieldDescriptor>,
    rejected: Vec<RejectedBlock>,
}

/// Split text into its top-level `{ ... }` blocks, returning each block with
/// the line its opening brace sits on.
///
/// `#` comment lines are skipped. An unclosed trailing block is returned as is
/// so that parsing it reports the missing brace.
fn split_blocks(text: &str) -> Vec<(usize, String)> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut start_line = 0;
    let mut depth = 0usize;
    let mut in_quote = false;

    for (index, line) in text.lines().enumerate() {
        if !in_quote && line.trim_start().starts_with('#') {
            continue;
        }
        for c in line.chars() {
            if depth == 0 {
                if c == '{' {
                    depth = 1;
                    start_line = index + 1;
                    current.push(c);
                }
                continue;
            }
            current.push(c);
            match c {
                '"' => in_quote = !in_quote,
                '{' if !in_quote => depth += 1,
                '}' if !in_quote => {
                    depth -= 1;
                    if depth == 0 {
                        blocks.push((start_line, std::mem::take(&mut current)));
                    }
                }
                _ => {}
            }
        }
        if depth > 0 {
            current.push('\n');
        }
        // quotes never span lines
        in_quote = false;
    }

    if depth > 0 && !current.is_empty() {
        blocks.push((start_line, current));
    }
    blocks
}

impl TemplateSet {
    /// Parse every block of a template file.
    ///
    /// A malformed block only drops its own field.
    pub fn parse(text: &str) -> Self {
        let mut set = TemplateSet::default();
        let mut names = HashSet::new();

        for (index, (line, block)) in split_blocks(text).into_iter().enumerate() {
            let result = FieldDescriptor::parse(&block).and_then(|field| {
                if names.insert(field.name().to_string()) {
                    Ok(field)
                } else {
                    Err(TemplateError::DuplicateName(field.name().to_string()))
                }
            });

            match result {
                Ok(field) => set.fields.push(field),
                Err(error) => {
                    log::warn!("Skipping template block {} (line {}): {}", index, line, error);
                    set.rejected.push(RejectedBlock { index, line, error });
                }
            }
        }

        log::debug!(
            "Parsed template set: {} fields, {} rejected",
            set.fields.len(),
            set.rejected.len()
        );
        set
    }

    /// Read and parse a template file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        log::info!("Loading templates from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn rejected(&self) -> &[RejectedBlock] {
        &self.rejected
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Take the parsed fields.
    pub fn into_fields(self) -> Vec<FieldDescriptor> {
        self.fields
    }
}
