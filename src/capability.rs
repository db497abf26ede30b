//! First-run handling for the guarded `cap_drop` declaration.
//!
//! The search service needs extra capabilities while it bootstraps its own
//! config, so on its first run the `cap_drop` block in `docker-compose.yml` is
//! commented out and tagged with [`DISABLED_MARKER`]. Once the service has
//! written its marker file, the block is restored byte-for-byte.
//!
//! The declaration is found by path (`services.<service>.<key>`) from the
//! document's indentation, and every located state is cross-checked against a
//! `serde_yaml` parse, so the active and disabled forms can never both match.

use crate::config::CapabilitySettings;
use crate::docker::DockerClient;
use crate::error::{Error, Result};
use crate::fsutil;
use std::path::Path;

/// Appended to the commented-out key line; its presence identifies the disabled form.
pub const DISABLED_MARKER: &str = "# temporarily disabled for first run";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityState {
    Active,
    Disabled,
}

/// Line range `[start, end)` holding the declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Declaration {
    start: usize,
    end: usize,
    state: CapabilityState,
}

fn split_eol(line: &str) -> (&str, &str) {
    let body = line.trim_end_matches(['\n', '\r']);
    (body, &line[body.len()..])
}

fn indent_of(body: &str) -> usize {
    body.len() - body.trim_start_matches(' ').len()
}

/// Non-blank and not a comment.
fn is_structural(body: &str) -> bool {
    let trimmed = body.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn after_key<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    body.trim_start().strip_prefix(name)?.strip_prefix(':')
}

/// `name:` opening a nested mapping (nothing but a comment after the colon).
fn is_mapping_key(body: &str, name: &str) -> bool {
    after_key(body, name).is_some_and(|rest| {
        let rest = rest.trim();
        rest.is_empty() || rest.starts_with('#')
    })
}

/// `name:` with any value.
fn is_key(body: &str, name: &str) -> bool {
    is_structural(body)
        && after_key(body, name)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
}

/// Whether `body` still belongs to a block whose key sits at `key_indent`.
fn continues(body: &str, key_indent: usize) -> bool {
    if body.trim().is_empty() {
        return false;
    }
    let indent = indent_of(body);
    let trimmed = body.trim_start();
    indent > key_indent || (indent == key_indent && (trimmed == "-" || trimmed.starts_with("- ")))
}

fn comment(body: &str) -> String {
    let indent = indent_of(body);
    format!("{}# {}", &body[..indent], &body[indent..])
}

fn uncomment(body: &str) -> Option<String> {
    let indent = indent_of(body);
    body[indent..]
        .strip_prefix("# ")
        .map(|rest| format!("{}{}", &body[..indent], rest))
}

fn strip_marker(body: &str) -> Option<&str> {
    body.strip_suffix(DISABLED_MARKER)?.strip_suffix("  ")
}

fn is_disabled_key(body: &str, key: &str) -> bool {
    strip_marker(body)
        .and_then(uncomment)
        .is_some_and(|original| is_key(&original, key))
}

/// Index after the last line of the block opened at `at`.
fn block_end(bodies: &[&str], at: usize, indent: usize) -> usize {
    let mut end = at + 1;
    while end < bodies.len() && !(is_structural(bodies[end]) && indent_of(bodies[end]) <= indent)
    {
        end += 1;
    }
    end
}

fn child_mapping(bodies: &[&str], from: usize, to: usize, name: &str) -> Option<usize> {
    let child_indent = bodies[from..to]
        .iter()
        .find(|b| is_structural(b))
        .map(|b| indent_of(b))?;
    (from..to).find(|&i| indent_of(bodies[i]) == child_indent && is_mapping_key(bodies[i], name))
}

fn extent<F>(bodies: &[&str], at: usize, key_indent: usize, layer: F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    let mut end = at + 1;
    while end < bodies.len() {
        match layer(bodies[end]) {
            Some(line) if continues(&line, key_indent) => end += 1,
            _ => break,
        }
    }
    end
}

fn locate(bodies: &[&str], service: &str, key: &str) -> Result<Option<Declaration>> {
    let Some(services_at) = bodies
        .iter()
        .position(|b| indent_of(b) == 0 && is_mapping_key(b, "services"))
    else {
        return Ok(None);
    };
    let services_end = block_end(bodies, services_at, 0);

    let Some(service_at) = child_mapping(bodies, services_at + 1, services_end, service) else {
        return Ok(None);
    };
    let service_indent = indent_of(bodies[service_at]);
    let service_end = block_end(bodies, service_at, service_indent);
    let key_indent = bodies[service_at + 1..service_end]
        .iter()
        .find(|b| is_structural(b))
        .map(|b| indent_of(b));

    let mut found: Option<Declaration> = None;
    for i in service_at + 1..service_end {
        let body = bodies[i];
        let indent = indent_of(body);
        if indent <= service_indent || key_indent.is_some_and(|k| k != indent) {
            continue;
        }

        let declaration = if is_key(body, key) {
            Declaration {
                start: i,
                end: extent(bodies, i, indent, |b| Some(b.to_string())),
                state: CapabilityState::Active,
            }
        } else if is_disabled_key(body, key) {
            Declaration {
                start: i,
                end: extent(bodies, i, indent, uncomment),
                state: CapabilityState::Disabled,
            }
        } else {
            continue;
        };

        if found.is_some() {
            return Err(Error::Capability(format!(
                "services.{}.{} appears more than once",
                service, key
            )));
        }
        found = Some(declaration);
    }

    Ok(found)
}

fn declared_in_tree(text: &str, service: &str, key: &str) -> Result<bool> {
    let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
    Ok(doc
        .get("services")
        .and_then(|s| s.get(service))
        .and_then(|svc| svc.get(key))
        .is_some())
}

/// Current state of `services.<service>.<key>`, or `None` when the document has no such declaration.
pub fn detect(text: &str, service: &str, key: &str) -> Result<Option<CapabilityState>> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let bodies: Vec<&str> = lines.iter().map(|l| split_eol(l).0).collect();
    let located = locate(&bodies, service, key)?.map(|d| d.state);
    let in_tree = declared_in_tree(text, service, key)?;

    match (located, in_tree) {
        (Some(CapabilityState::Active), true)
        | (Some(CapabilityState::Disabled), false)
        | (None, false) => Ok(located),
        (Some(CapabilityState::Active), false) => Err(Error::Capability(format!(
            "services.{}.{} was found in the text but not in the parsed document",
            service, key
        ))),
        (Some(CapabilityState::Disabled), true) => Err(Error::Capability(format!(
            "services.{}.{} is both disabled and active",
            service, key
        ))),
        (None, true) => Err(Error::Capability(format!(
            "services.{}.{} is declared in a form that cannot be toggled (use a block under the service)",
            service, key
        ))),
    }
}

fn transform(text: &str, service: &str, key: &str, target: CapabilityState) -> Result<Option<String>> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let bodies: Vec<&str> = lines.iter().map(|l| split_eol(l).0).collect();

    // Validates text/tree agreement before anything is rewritten
    detect(text, service, key)?;
    let Some(declaration) = locate(&bodies, service, key)? else {
        return Ok(None);
    };
    if declaration.state == target {
        return Ok(None);
    }

    let mut out = String::with_capacity(text.len() + DISABLED_MARKER.len() + 8);
    for (i, line) in lines.iter().enumerate() {
        let (body, eol) = split_eol(line);
        if !(declaration.start..declaration.end).contains(&i) {
            out.push_str(line);
            continue;
        }
        match target {
            CapabilityState::Disabled => {
                out.push_str(&comment(body));
                if i == declaration.start {
                    out.push_str("  ");
                    out.push_str(DISABLED_MARKER);
                }
            }
            CapabilityState::Active => {
                let layered = if i == declaration.start {
                    strip_marker(body).unwrap_or(body)
                } else {
                    body
                };
                let restored = uncomment(layered).ok_or_else(|| {
                    Error::Capability(format!("line {} of the disabled block is not commented", i + 1))
                })?;
                out.push_str(&restored);
            }
        }
        out.push_str(eol);
    }

    if detect(&out, service, key)? != Some(target) {
        return Err(Error::Capability(format!(
            "rewriting services.{}.{} did not produce the expected state",
            service, key
        )));
    }
    Ok(Some(out))
}

/// Comment out an active declaration. `None` when already disabled or absent.
pub fn disable(text: &str, service: &str, key: &str) -> Result<Option<String>> {
    transform(text, service, key, CapabilityState::Disabled)
}

/// Restore a disabled declaration. `None` when already active or absent.
pub fn enable(text: &str, service: &str, key: &str) -> Result<Option<String>> {
    transform(text, service, key, CapabilityState::Active)
}

/// The rewrite implied by the first-run decision, if any.
pub fn apply(text: &str, service: &str, key: &str, first_run: bool) -> Result<Option<String>> {
    if first_run {
        disable(text, service, key)
    } else {
        enable(text, service, key)
    }
}

/// Decide whether the dependent service has yet to finish its bootstrap.
///
/// No running instance, or an instance that cannot be probed, counts as first run.
pub async fn is_first_run(docker: &DockerClient, settings: &CapabilitySettings) -> bool {
    let names = docker.ps_names(&settings.container_filter).await;
    let Some(name) = names.first() else {
        tracing::info!(
            "No running '{}' container; treating as first run",
            settings.container_filter
        );
        return true;
    };
    if names.len() > 1 {
        tracing::warn!(
            "Several containers match '{}' ({}); probing the most recent one, '{}'",
            settings.container_filter,
            names.join(", "),
            name
        );
    }

    let probe = format!(
        "[ -f '{}' ] && echo found || echo missing",
        settings.marker_file
    );
    let outcome = docker.exec_sh(name, &probe).await;
    if !outcome.success() {
        tracing::warn!(
            "Could not probe '{}' for {}; treating as first run",
            name,
            settings.marker_file
        );
        return true;
    }

    let first_run = !outcome.stdout.contains("found");
    tracing::debug!(
        "Marker {} in '{}': {}",
        settings.marker_file,
        name,
        if first_run { "missing" } else { "found" }
    );
    first_run
}

/// What [`adjust`] did to the composition document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityOutcome {
    DocumentMissing,
    /// The document has no guarded declaration
    Absent,
    Disabled,
    Enabled,
    Unchanged(CapabilityState),
}

/// Rewrite the composition document for the given first-run decision.
pub fn adjust(
    compose_file: &Path,
    settings: &CapabilitySettings,
    first_run: bool,
) -> Result<CapabilityOutcome> {
    if !compose_file.exists() {
        tracing::warn!(
            "{} not found; skipping {} adjustment",
            compose_file.display(),
            settings.key
        );
        return Ok(CapabilityOutcome::DocumentMissing);
    }

    let mut before = None;
    let written = fsutil::rewrite(compose_file, |text| {
        before = detect(text, &settings.service, &settings.key)?;
        apply(text, &settings.service, &settings.key, first_run)
    })?;

    let outcome = match (before, written) {
        (None, _) => CapabilityOutcome::Absent,
        (Some(_), true) if first_run => CapabilityOutcome::Disabled,
        (Some(_), true) => CapabilityOutcome::Enabled,
        (Some(state), false) => CapabilityOutcome::Unchanged(state),
    };

    match outcome {
        CapabilityOutcome::Disabled => tracing::info!(
            "First {} run: {} temporarily disabled in {}",
            settings.service,
            settings.key,
            compose_file.display()
        ),
        CapabilityOutcome::Enabled => tracing::info!(
            "Re-enabled {} for {} in {}",
            settings.key,
            settings.service,
            compose_file.display()
        ),
        CapabilityOutcome::Absent => tracing::debug!(
            "No services.{}.{} in {}",
            settings.service,
            settings.key,
            compose_file.display()
        ),
        _ => tracing::debug!("{} already in the desired state", settings.key),
    }

    Ok(outcome)
}
