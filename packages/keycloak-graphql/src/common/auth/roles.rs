use super::HasCapabilities;

/// True when the caller holds at least one of `roles`
///
/// Roles are probed in order and the first match wins. A missing context or a
/// context without capabilities is never authorized.
pub fn is_authorized_by_role<C>(roles: &[String], context: Option<&C>) -> bool
where
    C: HasCapabilities + ?Sized,
{
    let Some(capabilities) = context.and_then(|c| c.capabilities()) else {
        return false;
    };

    roles.iter().any(|role| capabilities.has_role(role))
}
