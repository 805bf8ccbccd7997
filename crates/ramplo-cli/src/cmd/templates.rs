use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use ramplo_core::outreach::{OutreachCatalog, Personalization};
use std::path::Path;

#[derive(Subcommand)]
pub enum TemplatesSubcommand {
    /// List the outreach templates
    List,
    /// Render one template with your details filled in
    Show {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        market: Option<String>,
        #[arg(long)]
        nmls: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: TemplatesSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TemplatesSubcommand::List => list(root, json),
        TemplatesSubcommand::Show {
            id,
            name,
            company,
            market,
            nmls,
        } => show(
            root,
            &id,
            &Personalization {
                name,
                company,
                market,
                nmls,
            },
            json,
        ),
    }
}

fn load(root: &Path) -> anyhow::Result<OutreachCatalog> {
    let config = super::load_config(root)?;
    config
        .load_outreach_catalog(root)
        .context("failed to load outreach catalog")
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let catalog = load(root)?;
    if json {
        return print_json(&catalog.list());
    }
    let rows = catalog
        .list()
        .iter()
        .map(|t| {
            let focus: Vec<&str> = t.focus_areas.iter().map(|f| f.as_str()).collect();
            vec![
                t.id.clone(),
                t.channel.to_string(),
                t.tone.to_string(),
                if focus.is_empty() { "any".to_string() } else { focus.join(",") },
            ]
        })
        .collect();
    print_table(&["ID", "CHANNEL", "TONE", "FOCUS"], rows);
    Ok(())
}

fn show(root: &Path, id: &str, values: &Personalization, json: bool) -> anyhow::Result<()> {
    let catalog = load(root)?;
    let rendered = catalog.require(id)?.render(values);
    if json {
        return print_json(&rendered);
    }
    if let Some(subject) = &rendered.subject {
        println!("Subject: {subject}");
        println!();
    }
    println!("{}", rendered.body.trim_end());
    Ok(())
}
