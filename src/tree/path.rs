use std::fmt;

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub field: String,
    /// Position within a list field; `None` for single-node fields.
    pub index: Option<usize>,
}

/// Location of a node within a [`Tree`](super::Tree), as steps from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(Vec<Step>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, field: &str, index: Option<usize>) -> Self {
        let mut steps = self.0.clone();
        steps.push(Step {
            field: field.to_string(),
            index,
        });
        Self(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `self` is `ancestor` or lies somewhere below it.
    pub fn is_within(&self, ancestor: &NodePath) -> bool {
        self.0.starts_with(&ancestor.0)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for step in &self.0 {
            write!(f, ".{}", step.field)?;
            if let Some(index) = step.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}
