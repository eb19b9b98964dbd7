//! Built-in proposal templates
//!
//! Template content is stored in canonical markup form, exactly as the
//! codec serializes it, so loading a template is a plain deserialize
//! followed by a content replacement command.

use doc_model::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::markup;

/// A gallery template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Canonical document markup.
    pub content: String,
}

impl Template {
    fn new(id: &str, name: &str, description: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            content: content.to_string(),
        }
    }

    /// Parse this template's content into a document tree
    pub fn document(&self) -> Result<Document> {
        markup::deserialize(&self.content)
    }
}

/// The starter document for a brand-new proposal
pub fn default_document() -> Document {
    Document::from_blocks(vec![
        Node::heading(1, vec![Node::text("Untitled Proposal")]),
        Node::paragraph(vec![
            Node::text("Prepared for "),
            Node::placeholder("client_name"),
            Node::text(" by "),
            Node::placeholder("company_name"),
            Node::text("."),
        ]),
        Node::empty_paragraph(),
    ])
}

/// The built-in template gallery
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template::new(
            "seo",
            "SEO Services",
            "Search engine optimization engagement with a keyword and pricing table",
            "<h1>SEO Proposal</h1>\
             <p>Prepared for <span data-placeholder-key=\"client_name\">{{client_name}}</span> \
             by <span data-placeholder-key=\"company_name\">{{company_name}}</span>.</p>\
             <h2>Objectives</h2>\
             <ul>\
             <li><p>Grow organic search traffic</p></li>\
             <li><p>Improve rankings for priority keywords</p></li>\
             <li><p>Strengthen technical site health</p></li>\
             </ul>\
             <h2>Investment</h2>\
             <table>\
             <tr><th><p>Service</p></th><th><p>Monthly</p></th></tr>\
             <tr><td><p>On-page optimization</p></td>\
             <td><p><span data-placeholder-key=\"onpage_price\">{{onpage_price}}</span></p></td></tr>\
             <tr><td><p>Content production</p></td>\
             <td><p><span data-placeholder-key=\"content_price\">{{content_price}}</span></p></td></tr>\
             </table>\
             <div data-type=\"page-break\" class=\"page-break\"></div>\
             <h2>Next Steps</h2>\
             <p>We can start within two weeks of signature.</p>",
        ),
        Template::new(
            "web-design",
            "Web Design",
            "Website redesign project with phased scope",
            "<h1>Website Redesign Proposal</h1>\
             <p>For <span data-placeholder-key=\"client_name\">{{client_name}}</span></p>\
             <h2>Scope of Work</h2>\
             <ol>\
             <li><p>Discovery and wireframes</p></li>\
             <li><p>Visual design</p></li>\
             <li><p>Development and launch</p></li>\
             </ol>\
             <blockquote><p>Every page ships responsive and accessible.</p></blockquote>\
             <h2>Timeline</h2>\
             <p>Estimated delivery: <span data-placeholder-key=\"delivery_date\">{{delivery_date}}</span></p>",
        ),
        Template::new(
            "marketing",
            "Marketing Campaign",
            "Quarterly marketing campaign plan",
            "<h1>Marketing Campaign Proposal</h1>\
             <p>Prepared for <span data-placeholder-key=\"client_name\">{{client_name}}</span></p>\
             <h2>Channels</h2>\
             <ul>\
             <li><p>Paid social</p></li>\
             <li><p>Email nurture</p></li>\
             <li><p>Content marketing</p></li>\
             </ul>\
             <h2>Budget</h2>\
             <p>Total quarterly budget: <span data-placeholder-key=\"budget\">{{budget}}</span></p>",
        ),
        Template::new(
            "consulting",
            "Consulting Engagement",
            "General consulting engagement letter",
            "<h1>Consulting Proposal</h1>\
             <p>From <span data-placeholder-key=\"company_name\">{{company_name}}</span> \
             to <span data-placeholder-key=\"client_name\">{{client_name}}</span>.</p>\
             <h2>Engagement Overview</h2>\
             <p>This engagement covers advisory services as described below.</p>\
             <h2>Fees</h2>\
             <p>Hourly rate: <span data-placeholder-key=\"hourly_rate\">{{hourly_rate}}</span></p>\
             <hr/>\
             <p>Terms valid for 30 days.</p>",
        ),
    ]
}

/// Look up a built-in template by id
pub fn builtin_template(id: &str) -> Option<Template> {
    builtin_templates().into_iter().find(|t| t.id == id)
}
