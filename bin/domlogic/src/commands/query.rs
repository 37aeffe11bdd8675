use anyhow::Context;
use clap::Subcommand;
use domlogic_browser::{CdpOracle, MemoryOracle};
use domlogic_core::{Config, Oracle, Paths, ScopeConfig, ScopeOverride};
use domlogic_kanren::{run as solve_all, Term};
use domlogic_relations::{
    attribute, current_url, displayed, enabled, exists, present, selected, tag, text, title,
    visible, QueryContext, Relation,
};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

#[derive(Subcommand, Debug, Clone)]
pub enum RelationCommand {
    /// Elements whose attribute NAME equals VALUE
    Attribute { name: String, value: String },
    /// Elements with this tag name
    Tag { tag: String },
    /// Elements whose rendered text equals TEXT
    Text { text: String },
    /// Elements that are displayed
    Displayed,
    /// Elements that are enabled
    Enabled,
    /// Elements attached to the document
    Exists,
    /// Elements that exist and are displayed
    Present,
    /// Checked or chosen controls
    Selected,
    /// Elements that are visible
    Visible,
    /// The page title
    Title,
    /// The current URL
    Url,
}

impl RelationCommand {
    fn goal(&self, q: Term) -> Relation {
        match self {
            RelationCommand::Attribute { name, value } => {
                attribute(q, name.as_str(), value.as_str())
            }
            RelationCommand::Tag { tag: name } => tag(q, name.to_lowercase()),
            RelationCommand::Text { text: content } => text(q, content.as_str()),
            RelationCommand::Displayed => displayed(q),
            RelationCommand::Enabled => enabled(q),
            RelationCommand::Exists => exists(q),
            RelationCommand::Present => present(q),
            RelationCommand::Selected => selected(q),
            RelationCommand::Visible => visible(q),
            RelationCommand::Title => title(q),
            RelationCommand::Url => current_url(q),
        }
    }
}

pub struct QueryArgs {
    pub url: Option<String>,
    pub ws: Option<String>,
    pub html: Option<PathBuf>,
    pub root_scope: Option<String>,
    pub child_scope: Option<String>,
    pub limit: Option<usize>,
    pub relation: RelationCommand,
}

/// Connect to a page, solve the relation for its one free variable and print
/// each answer on its own line.
pub fn run(args: QueryArgs) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let over = ScopeOverride {
        root: args.root_scope,
        child: args.child_scope,
    };
    let scope = config.scope.overridden(&over);

    if let Some(path) = &args.html {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let url = args
            .url
            .unwrap_or_else(|| format!("file://{}", path.display()));
        info!(file = %path.display(), "Querying offline document");
        let oracle = Rc::new(MemoryOracle::new(&url, &source));
        return answer(oracle, scope, args.limit, &args.relation);
    }

    let mut browser = config.browser.clone();
    if let Some(ws) = args.ws {
        browser.ws_endpoint = Some(ws);
    }
    let oracle = Rc::new(CdpOracle::from_config(&browser, &paths)?);
    if let Some(url) = &args.url {
        oracle.navigate(url)?;
    }

    let result = answer(oracle.clone(), scope, args.limit, &args.relation);
    if let Ok(oracle) = Rc::try_unwrap(oracle) {
        oracle.close();
    }
    result
}

fn answer(
    oracle: Rc<dyn Oracle>,
    scope: ScopeConfig,
    limit: Option<usize>,
    relation: &RelationCommand,
) -> anyhow::Result<()> {
    let ctx = QueryContext::with_scope_config(oracle.clone(), scope);
    let answers = solve_all(&ctx, limit, |q| relation.goal(q))?;
    info!(answers = answers.len(), "Query finished");

    for answer in &answers {
        println!("{}", describe(&*oracle, answer));
    }
    if answers.is_empty() {
        println!("(no answers)");
    }
    Ok(())
}

fn describe(oracle: &dyn Oracle, answer: &Term) -> String {
    match answer {
        Term::Element(el) => match oracle.tag_name(el) {
            Ok(name) => format!("{:<10} {}", name.to_lowercase(), el.id()),
            Err(_) => el.to_string(),
        },
        Term::Str(s) => s.to_string(),
        other => other.to_string(),
    }
}
