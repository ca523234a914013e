//! `regstate path` - show how a raw path is understood

use anyhow::Result;
use regkit::{BitView, PathKind, RegistryPath, path};

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, raw: &str, value: bool) -> Result<()> {
    let kind = if value { PathKind::Value } else { PathKind::Key };
    let parsed = path::parse(raw, kind)?;

    if ctx.quiet {
        println!("{parsed}");
        return Ok(());
    }

    ui::header(&parsed.to_string());
    let key = parsed.key();
    ui::kv("hive", &format!("{} ({})", key.hive(), key.hive().long_name()));
    ui::kv(
        "view",
        match key.view() {
            BitView::Default => "default",
            BitView::Bit32 => "32-bit",
        },
    );
    if let RegistryPath::Value(value) = &parsed {
        ui::kv("key", &value.key().to_string());
        let name = if value.is_default() {
            "(default)"
        } else {
            value.name()
        };
        ui::kv("value", name);
    }

    // A value's own key comes first when looking for dependencies
    let mut ancestors: Vec<String> = Vec::new();
    if let RegistryPath::Value(value) = &parsed {
        ancestors.push(value.key().to_string());
    }
    ancestors.extend(key.ascend().map(|p| p.to_string()));
    if ancestors.is_empty() {
        ui::dim("hive root, no ancestors");
    } else {
        ui::kv("ancestors", "");
        for ancestor in &ancestors {
            ui::dim(&format!("  {ancestor}"));
        }
    }
    Ok(())
}
