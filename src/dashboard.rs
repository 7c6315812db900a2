// ABOUTME: Dashboard URL builders for operator guidance messages.
// ABOUTME: Used when a run fails and we point at the platform's own view.

pub fn dashboard_project_url(account_id: &str, project_name: &str) -> String {
    format!("https://dash.cloudflare.com/{account_id}/pages/view/{project_name}")
}

pub fn dashboard_deployment_url(
    account_id: &str,
    project_name: &str,
    deployment_id: Option<&str>,
) -> String {
    let base = dashboard_project_url(account_id, project_name);
    match deployment_id {
        Some(id) => format!("{base}/{id}"),
        None => base,
    }
}
