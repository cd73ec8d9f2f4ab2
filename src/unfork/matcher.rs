//! Pairing a forked resource with its most plausible upstream origin.

use log::debug;

use crate::resource::{Document, DocumentSet, Identity};

/// MatchResult is the upstream document a forked resource came from, if any,
/// and the name prefix the fork added to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Key of the matched document in the upstream set. None means the forked
    /// resource is new.
    pub upstream_key: Option<String>,
    /// Empty when the names match exactly.
    pub prefix: String,
}

impl MatchResult {
    pub fn none() -> Self {
        MatchResult::default()
    }

    fn found(document: &Document, prefix: &str) -> Self {
        MatchResult {
            upstream_key: Some(document.key().to_string()),
            prefix: prefix.to_string(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.upstream_key.is_some()
    }
}

/// Finds the upstream document that `forked` most plausibly derives from.
///
/// Candidates must share the kind and have compatible namespaces. An exact
/// name match wins first, then a candidate whose name equals the forked name
/// once `suspected_prefix` is stripped. Otherwise the candidate whose name is
/// the longest suffix of the forked name wins, and the rest of the forked
/// name becomes the prefix. Ties go to the first candidate in key order.
pub fn find_upstream_match(forked: &Identity, upstream: &DocumentSet, suspected_prefix: &str) -> MatchResult {
    let candidates: Vec<&Document> = upstream
        .iter()
        .filter(|u| u.identity().kind == forked.kind && u.identity().namespace_compatible(forked))
        .collect();

    if let Some(candidate) = candidates.iter().find(|u| u.identity().name == forked.name) {
        debug!("{} {:?} matches {} by name", forked.kind, forked.name, candidate.key());
        return MatchResult::found(candidate, "");
    }

    let prefixed = candidates
        .iter()
        .find(|u| forked.name.strip_prefix(suspected_prefix) == Some(u.identity().name.as_str()));
    if let Some(candidate) = prefixed {
        debug!(
            "{} {:?} matches {} with suspected prefix {:?}",
            forked.kind,
            forked.name,
            candidate.key(),
            suspected_prefix
        );
        return MatchResult::found(candidate, suspected_prefix);
    }

    let mut suffixed: Vec<&Document> = candidates
        .into_iter()
        .filter(|u| forked.name.ends_with(u.identity().name.as_str()))
        .collect();
    suffixed.sort_by(|a, b| b.identity().name.len().cmp(&a.identity().name.len()));

    match suffixed.first() {
        Some(candidate) => {
            let prefix = &forked.name[..forked.name.len() - candidate.identity().name.len()];
            debug!(
                "{} {:?} matches {} with derived prefix {:?}",
                forked.kind,
                forked.name,
                candidate.key(),
                prefix
            );
            MatchResult::found(candidate, prefix)
        }
        None => MatchResult::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NGINX_DEPLOYMENT: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment
spec:
  replicas: 3
  selector:
    matchLabels:
      app: nginx
  template:
    metadata:
      labels:
        app: nginx
    spec:
      containers:
        - name: nginx
          image: nginx:1.7.9
          ports:
           - containerPort: 80
"#;

    const DATABASE: &str = r#"apiVersion: databases.schemahero.io/v1alpha2
kind: Database
metadata:
  name: rds-postgres
  namespace: default
connection:
  postgres:
    uri:
      valueFrom:
        secretKeyRef:
          key: uri
          name: rds-postgres
"#;

    fn upstream() -> DocumentSet {
        DocumentSet::from_entries([
            ("deployment.yaml", NGINX_DEPLOYMENT.to_string()),
            ("database.yaml", DATABASE.to_string()),
            ("deployment-2.yaml", NGINX_DEPLOYMENT.replace("name: nginx-deployment", "name: deployment")),
        ])
    }

    fn deployment(name: &str) -> Identity {
        Identity::new("apps/v1", "Deployment", name).in_namespace("default")
    }

    fn matched(key: &str, prefix: &str) -> MatchResult {
        MatchResult {
            upstream_key: Some(key.to_string()),
            prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_find_a_deployment() {
        let result = find_upstream_match(&deployment("nginx-deployment"), &upstream(), "");
        assert_eq!(result, matched("deployment.yaml", ""));
    }

    #[test]
    fn test_find_a_deployment_by_prefix() {
        // both upstream deployments are suffixes of the forked name
        let result = find_upstream_match(&deployment("myprefixed-nginx-deployment"), &upstream(), "myprefixed-");
        assert_eq!(result, matched("deployment.yaml", "myprefixed-"));
    }

    #[test]
    fn test_find_a_nonexistent_deployment() {
        let result = find_upstream_match(&deployment("this-is-a-unique-name"), &upstream(), "");
        assert_eq!(result, MatchResult::none());
        assert!(!result.is_match());
    }

    #[test]
    fn test_find_a_deployment_by_suspected_prefix() {
        let result = find_upstream_match(&deployment("myprefixed-nginx-deployment"), &upstream(), "myprefixed-nginx-");
        assert_eq!(result, matched("deployment-2.yaml", "myprefixed-nginx-"));
    }

    #[test]
    fn test_find_a_database_despite_incorrect_suspected_prefix() {
        let forked = Identity::new("databases.schemahero.io/v1alpha2", "Database", "something-rds-postgres").in_namespace("default");
        let result = find_upstream_match(&forked, &upstream(), "myprefixed-");
        assert_eq!(result, matched("database.yaml", "something-"));
    }

    #[test]
    fn test_suffix_match_prefers_longest_upstream_name() {
        let result = find_upstream_match(&deployment("myprefixed-nginx-deployment"), &upstream(), "");
        assert_eq!(result, matched("deployment.yaml", "myprefixed-"));
    }

    #[test]
    fn test_suffix_derived_prefix() {
        let set = DocumentSet::from_entries([(
            "redis.yaml",
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: redis\n",
        )]);
        let forked = Identity::new("v1", "Service", "jaunty-quail-redis");
        assert_eq!(find_upstream_match(&forked, &set, ""), matched("redis.yaml", "jaunty-quail-"));
    }

    #[test]
    fn test_exact_match_beats_suspected_prefix_on_earlier_key() {
        let set = DocumentSet::from_entries([
            ("a.yaml", "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n"),
            ("b.yaml", "apiVersion: v1\nkind: Service\nmetadata:\n  name: p-web\n"),
        ]);
        let forked = Identity::new("v1", "Service", "p-web");
        assert_eq!(find_upstream_match(&forked, &set, "p-"), matched("b.yaml", ""));
        assert_eq!(find_upstream_match(&forked, &set, ""), matched("b.yaml", ""));

        let prefixed = Identity::new("v1", "Service", "q-web");
        assert_eq!(find_upstream_match(&prefixed, &set, "q-"), matched("a.yaml", "q-"));
    }

    #[test]
    fn test_suspected_prefix_preempts_suffix_rule() {
        let set = DocumentSet::from_entries([
            ("long.yaml", "apiVersion: v1\nkind: Service\nmetadata:\n  name: team-api\n"),
            ("short.yaml", "apiVersion: v1\nkind: Service\nmetadata:\n  name: api\n"),
        ]);
        let forked = Identity::new("v1", "Service", "acme-team-api");
        assert_eq!(find_upstream_match(&forked, &set, "acme-team-"), matched("short.yaml", "acme-team-"));
        assert_eq!(find_upstream_match(&forked, &set, ""), matched("long.yaml", "acme-"));
    }

    #[test]
    fn test_namespace_and_kind_must_be_compatible() {
        let set = DocumentSet::from_entries([(
            "svc.yaml",
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n  namespace: dev\n",
        )]);
        let prod = Identity::new("v1", "Service", "web").in_namespace("prod");
        assert_eq!(find_upstream_match(&prod, &set, ""), MatchResult::none());

        let unscoped = Identity::new("v1", "Service", "web");
        assert_eq!(find_upstream_match(&unscoped, &set, ""), matched("svc.yaml", ""));

        let other_kind = Identity::new("v1", "ConfigMap", "web");
        assert_eq!(find_upstream_match(&other_kind, &set, ""), MatchResult::none());
    }
}
