//! Routing decision engine.
//!
//! A [`Router`] evaluates an ordered rule table and the first matching
//! rule decides the category. The default table is:
//!
//! 1. a pending action answered with yes/no goes to ORDER
//! 2. keyword overrides: CRM update, returns, fraud, stock, escalation, purchase
//! 3. the model classifier
//!
//! and ORDER when nothing matches. Overrides sit above the classifier, so a
//! keyword match always wins over whatever the model would have said.

use std::sync::{Arc, OnceLock};

use concierge_agent::specialists::classifier_task;
use concierge_agent::TaskRunner;
use concierge_core::routing::Category;
use concierge_core::session::Session;
use regex_lite::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::extract;
use crate::lexicon::{self, contains_any, normalize};

/// One entry of the rule table.
#[derive(Debug, Clone)]
pub enum Rule {
    /// The session holds a pending action and the message confirms or cancels it.
    PendingReply,
    /// The normalized message contains any of `phrases`.
    Keywords {
        name: &'static str,
        category: Category,
        phrases: &'static [&'static str],
    },
    /// Ask the model. Skipped when the router has no classifier.
    Classifier,
}

impl Rule {
    pub fn keywords(name: &'static str, category: Category, phrases: &'static [&'static str]) -> Self {
        Self::Keywords {
            name,
            category,
            phrases,
        }
    }
}

/// The built-in table.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::PendingReply,
        Rule::keywords("crm_update", Category::CrmSync, lexicon::CRM_UPDATE),
        Rule::keywords("returns", Category::Returns, lexicon::RETURNS),
        Rule::keywords("fraud", Category::Fraud, lexicon::FRAUD),
        Rule::keywords("stock", Category::Inventory, lexicon::STOCK),
        Rule::keywords("escalation", Category::Escalation, lexicon::ESCALATION),
        Rule::keywords("order_intent", Category::Order, lexicon::ORDER_INTENT),
        Rule::Classifier,
    ]
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rule", rename_all = "snake_case")]
pub enum RouteSource {
    PendingAction,
    Override(&'static str),
    /// The model answered with an explicit category marker.
    Classifier,
    /// The model answered, but only a text scan found a category.
    ClassifierFallback,
    Default,
}

impl RouteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingAction => "pending_action",
            Self::Override(_) => "override",
            Self::Classifier => "classifier",
            Self::ClassifierFallback => "classifier_fallback",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub category: Category,
    pub source: RouteSource,
}

/// How a classifier answer was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierReading {
    /// `CATEGORY: X` (or an equivalent marker) with a known category.
    Marker(Category),
    /// No usable marker; a category name was found in the text.
    TextScan(Category),
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:category|final answer|specialist|select|routed to)\s*:?\s*([a-z_]+)")
            .expect("classifier marker pattern is valid")
    })
}

/// Non-default categories first, so an answer mentioning both ORDER and
/// RETURNS resolves to RETURNS.
const SCAN_ORDER: &[(&str, Category)] = &[
    ("RETURN", Category::Returns),
    ("INVENTORY", Category::Inventory),
    ("FRAUD", Category::Fraud),
    ("CRM", Category::CrmSync),
    ("SALESFORCE", Category::CrmSync),
    ("ESCALATION", Category::Escalation),
    ("ORDER", Category::Order),
];

/// Read a category out of the classifier's free-text answer.
pub fn parse_classifier_answer(answer: &str) -> Option<ClassifierReading> {
    for caps in marker_pattern().captures_iter(answer) {
        if let Some(category) = caps.get(1).and_then(|m| m.as_str().parse::<Category>().ok()) {
            return Some(ClassifierReading::Marker(category));
        }
    }

    let upper = answer.to_uppercase();
    SCAN_ORDER
        .iter()
        .find(|(needle, _)| upper.contains(needle))
        .map(|(_, category)| ClassifierReading::TextScan(*category))
}

/// The routing decision engine.
pub struct Router {
    rules: Vec<Rule>,
    classifier: Option<Arc<TaskRunner>>,
    classifier_max_iterations: u32,
}

impl Router {
    /// A router over the default table, without a classifier.
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            classifier: None,
            classifier_max_iterations: 1,
        }
    }

    pub fn with_classifier(mut self, runner: Arc<TaskRunner>, max_iterations: u32) -> Self {
        self.classifier = Some(runner);
        self.classifier_max_iterations = max_iterations.max(1);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Decide which specialist handles `message`.
    pub async fn route(&self, session: &Session, message: &str) -> RoutingDecision {
        let text = normalize(message);

        for rule in &self.rules {
            let decision = match rule {
                Rule::PendingReply => (session.has_pending() && extract::reply(message).is_some())
                    .then_some(RoutingDecision {
                        category: Category::Order,
                        source: RouteSource::PendingAction,
                    }),
                Rule::Keywords {
                    name,
                    category,
                    phrases,
                } => contains_any(&text, phrases).then_some(RoutingDecision {
                    category: *category,
                    source: RouteSource::Override(*name),
                }),
                Rule::Classifier => self.classify(&session.user, message).await,
            };

            if let Some(decision) = decision {
                debug!(
                    user = %session.user,
                    category = %decision.category,
                    source = decision.source.as_str(),
                    "Routing rule matched"
                );
                return decision;
            }
        }

        RoutingDecision {
            category: Category::default(),
            source: RouteSource::Default,
        }
    }

    async fn classify(&self, user: &str, message: &str) -> Option<RoutingDecision> {
        let runner = self.classifier.as_ref()?;
        let task = classifier_task(message, user, self.classifier_max_iterations);

        let answer = match runner.run(&task).await {
            Ok(report) => report.answer,
            Err(e) => {
                warn!(user = %user, error = %e, "Classifier failed, falling back to default route");
                return None;
            }
        };

        match parse_classifier_answer(&answer) {
            Some(ClassifierReading::Marker(category)) => {
                info!(user = %user, category = %category, "Classifier routed message");
                Some(RoutingDecision {
                    category,
                    source: RouteSource::Classifier,
                })
            }
            Some(ClassifierReading::TextScan(category)) => {
                warn!(
                    user = %user,
                    category = %category,
                    answer = %answer,
                    "Classifier gave no category marker; routing on text scan"
                );
                Some(RoutingDecision {
                    category,
                    source: RouteSource::ClassifierFallback,
                })
            }
            None => {
                warn!(user = %user, answer = %answer, "Classifier answer names no category");
                None
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
