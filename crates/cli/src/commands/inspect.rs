use std::path::Path;

use anyhow::{Context, Result};
use fieldscope_core::model::ClassModel;
use fieldscope_core::services::analysis::inspect_class;

/// Decode one class file and print what the analyzer sees.
pub fn inspect_command(path: &Path, json: bool) -> Result<()> {
    let class = inspect_class(path)
        .with_context(|| format!("Failed to decode class file {}", path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&class)?);
    } else {
        print!("{}", describe_class(&class));
    }
    Ok(())
}

/// Human-readable multi-line summary of a decoded class.
pub fn describe_class(class: &ClassModel) -> String {
    let mut out = String::new();
    out.push_str(&format!("Class: {} ({:?})\n", class.name, class.kind));
    if let Some(superclass) = &class.superclass {
        out.push_str(&format!("  Extends: {superclass}\n"));
    }
    for interface in &class.interfaces {
        out.push_str(&format!("  Implements: {interface}\n"));
    }
    if let Some(signature) = &class.generic_signature {
        out.push_str(&format!("  Signature: {signature}\n"));
    }
    for annotation in &class.annotations {
        out.push_str(&format!("  @{}\n", annotation.type_name));
    }

    out.push_str(&format!("Fields ({}):\n", class.declared_fields.len()));
    for field in &class.declared_fields {
        let modifier = if field.is_static() { "static " } else { "" };
        out.push_str(&format!("  - {modifier}{} {}\n", field.name, field.descriptor));
    }

    out.push_str(&format!("Methods ({}):\n", class.methods.len()));
    for method in &class.methods {
        let lines = method.line_range.map(|r| format!(" [lines {r}]")).unwrap_or_default();
        out.push_str(&format!("  - {}{}{lines}\n", method.id.name, method.id.descriptor));
        for (target, count) in &method.called_methods {
            out.push_str(&format!("      calls {target} x{count}\n"));
        }
        for access in &method.field_accesses {
            out.push_str(&format!("      {:?} {}.{}\n", access.kind, access.owner, access.name));
        }
        for lambda in &method.lambda_implementations {
            out.push_str(&format!(
                "      lambda {} as {}.{}\n",
                lambda.implementation, lambda.functional_interface, lambda.interface_method
            ));
        }
    }
    out
}
