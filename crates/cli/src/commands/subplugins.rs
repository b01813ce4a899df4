use std::path::Path;

use cc_protocol::{AdminAction, SubpluginKind};
use colored::Colorize;
use color_eyre::Result;

use crate::context::Context;
use crate::output::print_table;

/// Execute `trigger` / `step`: apply an action if given, then list the registry.
pub async fn execute(root: &Path, kind: SubpluginKind, action: Option<(AdminAction, i64)>) -> Result<()> {
    let ctx = Context::open(root).await?;
    let registry = match kind {
        SubpluginKind::Trigger => ctx.engine.triggers(),
        SubpluginKind::Step => ctx.engine.steps(),
    };

    if let Some((action, id)) = action {
        let record = registry.handle_action(action, id)?;
        println!("{} {kind} '{}'", action.to_string().green(), record.name);
    }

    let rows = registry
        .list()?
        .into_iter()
        .map(|record| {
            vec![
                record.id.to_string(),
                record.name,
                record
                    .sortindex
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                if record.enabled {
                    "yes".green().to_string()
                } else {
                    "no".dimmed().to_string()
                },
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "ORDER", "ENABLED"], rows);
    Ok(())
}
