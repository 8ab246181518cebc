use crate::core::value_path::ValuePath;
use crate::form::tree::FormNode;

/// A selectable row of the form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    Field(ValuePath),
    Remove(ValuePath, usize),
    Append(ValuePath),
    Submit,
}

/// Focus order: fields in tree order, each list item followed by its remove
/// control, each list followed by its add control, then submit.
pub fn focus_targets(root: &FormNode) -> Vec<FocusTarget> {
    let mut out = Vec::new();
    collect(root, &mut out);
    out.push(FocusTarget::Submit);
    out
}

fn collect(node: &FormNode, out: &mut Vec<FocusTarget>) {
    match node {
        FormNode::Field { path, .. } => out.push(FocusTarget::Field(path.clone())),
        FormNode::Group { children, .. } => {
            for child in children {
                collect(child, out);
            }
        }
        FormNode::List { path, items, .. } => {
            for (index, item) in items.iter().enumerate() {
                collect(item, out);
                out.push(FocusTarget::Remove(path.clone(), index));
            }
            out.push(FocusTarget::Append(path.clone()));
        }
    }
}
