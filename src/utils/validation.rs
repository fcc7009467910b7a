use crate::utils::error::{DeployError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> DeployError {
    DeployError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(field_name, url_str, format!("Invalid URL format: {}", e))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| DeployError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            &value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

pub fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            field_name,
            region,
            "AWS region can only contain lowercase letters, numbers, and hyphens",
        ));
    }

    Ok(())
}

pub fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid(
            field_name,
            bucket_name,
            "S3 bucket name must be between 3 and 63 characters",
        ));
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            field_name,
            bucket_name,
            "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(invalid(
            field_name,
            bucket_name,
            "S3 bucket name cannot start or end with a hyphen",
        ));
    }

    Ok(())
}

/// IPv4 CIDR，前綴長度限制在 VPC 允許的 /16 到 /28
pub fn validate_vpc_cidr(field_name: &str, cidr: &str) -> Result<()> {
    let (address, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| invalid(field_name, cidr, "CIDR must be in the form a.b.c.d/n"))?;

    address
        .parse::<std::net::Ipv4Addr>()
        .map_err(|e| invalid(field_name, cidr, format!("Invalid IPv4 address: {}", e)))?;

    let prefix: u8 = prefix
        .parse()
        .map_err(|_| invalid(field_name, cidr, "Prefix length must be a number"))?;

    if !(16..=28).contains(&prefix) {
        return Err(invalid(
            field_name,
            cidr,
            "VPC prefix length must be between 16 and 28",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("provisioner_url", "https://example.com").is_ok());
        assert!(validate_url("provisioner_url", "http://example.com").is_ok());
        assert!(validate_url("provisioner_url", "").is_err());
        assert!(validate_url("provisioner_url", "invalid-url").is_err());
        assert!(validate_url("provisioner_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_aws_region() {
        assert!(validate_aws_region("region", "us-east-1").is_ok());
        assert!(validate_aws_region("region", "cn-northwest-1").is_ok());
        assert!(validate_aws_region("region", "").is_err());
        assert!(validate_aws_region("region", "US_EAST_1").is_err());
    }

    #[test]
    fn test_validate_s3_bucket_name() {
        assert!(validate_s3_bucket_name("UPLOAD_BUCKET", "my-bucket").is_ok());
        assert!(validate_s3_bucket_name("UPLOAD_BUCKET", "ab").is_err());
        assert!(validate_s3_bucket_name("UPLOAD_BUCKET", "My-Bucket").is_err());
        assert!(validate_s3_bucket_name("UPLOAD_BUCKET", "-bucket").is_err());
    }

    #[test]
    fn test_validate_vpc_cidr() {
        assert!(validate_vpc_cidr("VPC_CIDR", "10.0.0.0/16").is_ok());
        assert!(validate_vpc_cidr("VPC_CIDR", "10.0.0.0").is_err());
        assert!(validate_vpc_cidr("VPC_CIDR", "10.0.0/16").is_err());
        assert!(validate_vpc_cidr("VPC_CIDR", "10.0.0.0/8").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("MAX_AZS", 2, 1, 6).is_ok());
        assert!(validate_range("MAX_AZS", 0, 1, 6).is_err());
    }
}
