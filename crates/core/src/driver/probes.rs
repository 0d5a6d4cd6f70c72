//! Scripts evaluated inside the viewer page.
//!
//! The vendor's object model differs between page versions, so every call
//! into the viewer goes through an ordered list of candidate entry points:
//! try the first, else the next, else do nothing. Each candidate is read
//! fresh from the page on every tick.

use serde_json::Value;

/// Result of one probe-dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The candidate at this index exposed the method and was called.
    Hit(usize),
    /// No candidate exposed the method.
    Miss,
}

impl ProbeOutcome {
    /// Decode the value returned by an [`invoke_script`] evaluation.
    pub fn from_value(value: &Value) -> Self {
        match value.as_i64() {
            Some(index) if index >= 0 => Self::Hit(index as usize),
            _ => Self::Miss,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// JS string literal for `s`.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Build a script that calls `method(args)` on the first candidate exposing
/// it. Evaluates to the candidate index, or -1 when none matched.
pub fn invoke_script(candidates: &[String], method: &str, args: &str) -> String {
    let getters: Vec<String> = candidates
        .iter()
        .map(|expr| format!("    () => ({expr}),"))
        .collect();
    let method = js_string(method);

    format!(
        r#"(() => {{
  const candidates = [
{getters}
  ];
  for (let i = 0; i < candidates.length; i++) {{
    let target = null;
    try {{ target = candidates[i](); }} catch (e) {{ target = null; }}
    if (target && typeof target[{method}] === 'function') {{
      try {{ target[{method}]({args}); return i; }} catch (e) {{}}
    }}
  }}
  return -1;
}})()"#,
        getters = getters.join("\n"),
    )
}

/// Build a script that finds the first element matching one of `selectors`,
/// dispatches a mouse event of type `event` on it and sets
/// `{skin}.elementMouseDown[control_id]` to `held` when that map exists.
/// Evaluates to `true` when a control was found.
pub fn control_script(
    selectors: &[String],
    event: &str,
    skin: &str,
    control_id: &str,
    held: bool,
) -> String {
    let selectors = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    let event = js_string(event);
    let control_id = js_string(control_id);

    format!(
        r#"(() => {{
  const selectors = {selectors};
  let control = null;
  for (const selector of selectors) {{
    try {{ control = document.querySelector(selector); }} catch (e) {{ control = null; }}
    if (control) break;
  }}
  if (!control) return false;
  control.dispatchEvent(new MouseEvent({event}, {{ bubbles: true, cancelable: true, view: window }}));
  try {{
    const skin = ({skin});
    if (skin && skin.elementMouseDown) skin.elementMouseDown[{control_id}] = {held};
  }} catch (e) {{}}
  return true;
}})()"#
    )
}
