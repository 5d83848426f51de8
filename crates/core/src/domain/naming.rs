//! Naming-convention candidates for repository targets.
//!
//! `com.shop.order.repository.IOrderRepository` yields base names `Order`
//! (prefix stripped) and `IOrder`, and for each base name the candidates
//! `com.shop.order.domain.Order`, `com.shop.order.repository.Order`,
//! `com.shop.order.repository.domain.Order`, `com.shop.order.Order`.

use crate::config::DomainConventions;
use crate::model::simple_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingMatch {
    /// Derived aggregate simple names, most likely first.
    pub base_names: Vec<String>,
    /// Fully qualified candidates in trial order, deduplicated.
    pub candidates: Vec<String>,
}

pub fn naming_candidates(class_name: &str, conventions: &DomainConventions) -> Option<NamingMatch> {
    let simple = simple_name(class_name);
    let simple = simple.rsplit('$').next().unwrap_or(simple);
    let package = match class_name.rfind('.') {
        Some(idx) => &class_name[..idx],
        None => "",
    };

    let mut names = Vec::new();
    if let Some(prefix) = conventions.interface_prefix.as_deref().filter(|p| !p.is_empty()) {
        if let Some(rest) = simple.strip_prefix(prefix) {
            if rest.chars().next().is_some_and(|c| c.is_uppercase()) {
                names.push(rest);
            }
        }
    }
    names.push(simple);

    let mut base_names = Vec::new();
    for name in names {
        if let Some(base) = strip_suffix(name, &conventions.repository_suffixes) {
            if !base_names.iter().any(|b: &String| b == base) {
                base_names.push(base.to_string());
            }
        }
    }
    if base_names.is_empty() {
        return None;
    }

    let mut candidates = Vec::new();
    for base in &base_names {
        for candidate in package_candidates(package, base, conventions) {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }
    Some(NamingMatch { base_names, candidates })
}

fn strip_suffix<'a>(name: &'a str, suffixes: &[String]) -> Option<&'a str> {
    suffixes
        .iter()
        .filter(|s| !s.is_empty())
        .find_map(|suffix| name.strip_suffix(suffix.as_str()).filter(|base| !base.is_empty()))
}

fn qualify(package: &[&str], name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package.join("."), name)
    }
}

fn package_candidates(package: &str, base: &str, conventions: &DomainConventions) -> Vec<String> {
    let segments: Vec<&str> =
        if package.is_empty() { Vec::new() } else { package.split('.').collect() };
    let mut out = Vec::new();
    let mut dropped = Vec::new();

    for rule in &conventions.package_rewrites {
        if let Some(pos) = segments.iter().rposition(|s| *s == rule.segment) {
            let mut rewritten = segments.clone();
            rewritten[pos] = rule.replacement.as_str();
            out.push(qualify(&rewritten, base));

            let mut parent = segments.clone();
            parent.remove(pos);
            dropped.push(qualify(&parent, base));
        }
    }

    out.push(qualify(&segments, base));
    let mut with_domain = segments.clone();
    with_domain.push("domain");
    out.push(qualify(&with_domain, base));
    out.extend(dropped);
    out
}
