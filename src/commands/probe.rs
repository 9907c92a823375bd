use crate::proxy::mappers::response::decode;
use crate::proxy::state::GatewayState;
use crate::proxy::upstream::client::Transport;
use crate::proxy::upstream::params::RequestParams;
use serde_json::json;

// `key=value` sets a value, `key=` sends an empty value and a bare `key`
// marks the parameter as present without a value.
pub fn parse_param_args(args: &[String]) -> RequestParams {
    let mut params = RequestParams::new();
    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => params.set(key, value),
            Some(_) => tracing::warn!("Ignoring parameter without a name: {}", arg),
            None => params.set_optional(arg.as_str(), None),
        }
    }
    params
}

pub async fn probe<T: Transport>(
    state: &GatewayState<T>,
    client_key: &str,
    server_id: &str,
    procedure: &str,
    params: RequestParams,
    separator: &str,
) -> Result<serde_json::Value, String> {
    if !state.admit(client_key) {
        return Err(format!("rate_limited: too many requests from {}", client_key));
    }

    let bundle = state
        .bundle_for(server_id)
        .ok_or_else(|| format!("unknown_server: {}", server_id))?;

    let body = bundle
        .send(procedure, params)
        .await
        .into_result()
        .map_err(|failure| bundle.describe_failure(&failure))?;

    Ok(json!({
        "server": bundle.server().name,
        "procedure": bundle.server().procedure_name(procedure),
        "denied": crate::proxy::mappers::response::is_sentinel(&body),
        "fields": decode(&body, separator),
    }))
}
