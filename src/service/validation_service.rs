use crate::module::dapi::schema::SubmitDapiRequest;
use crate::module::error::AppError;

const ALLOWED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

pub fn validate_submit_request(req: &SubmitDapiRequest) -> Result<(), AppError> {
    if !is_evm_address(&req.owner_address) {
        return Err(AppError::bad_request(
            "INVALID_OWNER_ADDRESS",
            "owner_address must be a 0x-prefixed 20-byte hex address",
        ));
    }
    if req.oracle_info.source_chain_id <= 0 || req.oracle_info.target_chain_id <= 0 {
        return Err(AppError::bad_request(
            "INVALID_CHAIN_ID",
            "chain ids must be positive integers",
        ));
    }

    let web2 = &req.oracle_info.web2_info;
    if web2.uri.trim().is_empty() || !web2.uri.starts_with("http") {
        return Err(AppError::bad_request(
            "INVALID_WEB2_URI",
            "web2 uri must be an http(s) url",
        ));
    }
    if !ALLOWED_METHODS.contains(&web2.method.to_uppercase().as_str()) {
        return Err(AppError::bad_request(
            "INVALID_WEB2_METHOD",
            format!("unsupported http method: {}", web2.method),
        ));
    }

    Ok(())
}

fn is_evm_address(input: &str) -> bool {
    let Some(hex_part) = input.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}
