use crate::model::tracked_item::TrackedItem;
use crate::util::adf::description_text;

pub const MAX_TITLE_CHARS: usize = 250;
const ELLIPSIS: char = '…';

pub fn browse_url(jira_base_url: &str, key: &str) -> String {
    format!("{jira_base_url}/browse/{key}")
}

/// `[JIRA <key>] <summary>`, cut to 250 characters plus an ellipsis.
///
/// The title embeds the Jira key and is what ties a mirrored issue back to its
/// tracked item on later runs.
pub fn build_title(item: &TrackedItem) -> String {
    let title = format!("[JIRA {}] {}", item.key, item.summary);
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title;
    }
    let mut truncated: String = title.chars().take(MAX_TITLE_CHARS).collect();
    truncated.push(ELLIPSIS);
    truncated
}

pub fn build_body(item: &TrackedItem, jira_base_url: &str) -> String {
    let description = description_text(item.description.as_ref());

    let mut relations = String::new();
    if let Some(epic) = &item.epic_key {
        relations.push_str(&format!(
            "\n\n**Epic:** [{epic}]({})",
            browse_url(jira_base_url, epic)
        ));
    }
    if let Some(parent) = &item.parent_key {
        relations.push_str(&format!(
            "\n\n**Parent Issue:** [{parent}]({})",
            browse_url(jira_base_url, parent)
        ));
    }

    let body = format!(
        "**JIRA URL:** [{key}]({url})\n\n\
         **Summary:** {summary}\n\n\
         **Status:** {status}\n\n\
         **Description:**\n\n\
         {description}\n\
         {relations}",
        key = item.key,
        url = browse_url(jira_base_url, &item.key),
        summary = item.summary,
        status = item.status_name,
        description = description.trim(),
    );
    body.trim().to_string()
}
