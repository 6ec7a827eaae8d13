//! In-page scripts used by the Chromium driver.
//!
//! Every script runs inside an IIFE that installs the `__easyapply` helper object once per
//! document and returns a JSON string, so results cross the protocol as plain strings.

use easyapply_core_types::ControlId;

/// Attribute the driver stamps on every element it hands out.
pub const ID_ATTR: &str = "data-easyapply-id";

const PRELUDE: &str = r#"
const EA = window.__easyapply || (window.__easyapply = (() => {
  const ATTR = 'data-easyapply-id';
  let seq = 0;
  const tag = (el) => {
    if (!el) return null;
    let id = el.getAttribute(ATTR);
    if (!id) {
      seq += 1;
      id = 'ea-' + seq + '-' + Date.now().toString(36);
      el.setAttribute(ATTR, id);
    }
    return id;
  };
  const byId = (id) => document.querySelector('[' + ATTR + '="' + id + '"]');
  const visible = (el) => !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
  const text = (el) => (el ? (el.innerText || el.textContent || '') : '').trim();
  const isChoice = (el) => !!el && (el.matches('input[type="radio"], input[type="checkbox"], [role="radio"]'));
  const groupOf = (el) => el.closest('fieldset, [role="radiogroup"], [role="group"]');
  const groupKind = (el) => {
    if (!el) return 'none';
    if (el.matches('input, select, textarea')) return 'none';
    if (el.matches('[role="radiogroup"]') || el.querySelector('input[type="radio"], [role="radio"]')) return 'radio_group';
    if (el.querySelector('input[type="checkbox"]')) return 'checkbox_group';
    return 'none';
  };
  const promote = (el) => {
    if (!isChoice(el)) return el;
    const group = groupOf(el);
    return group && groupKind(group) !== 'none' ? group : el;
  };
  const following = (el) => {
    const nested = el.querySelector('input, textarea, select');
    if (nested) return nested;
    const hit = document.evaluate(
      'following::*[self::input or self::textarea or self::select][1]',
      el, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null);
    return hit.singleNodeValue;
  };
  const labelTarget = (label) => {
    const forId = label.getAttribute('for');
    const direct = forId ? document.getElementById(forId) : null;
    const target = direct || following(label);
    return target ? promote(target) : null;
  };
  const groupLabel = (el) => {
    const legend = el.querySelector('legend');
    if (legend) return text(legend);
    const labelledBy = el.getAttribute('aria-labelledby');
    if (labelledBy) {
      const ref = document.getElementById(labelledBy.split(' ')[0]);
      if (ref) return text(ref);
    }
    if (el.getAttribute('aria-label')) return el.getAttribute('aria-label').trim();
    const first = el.querySelector('label, span, p');
    return first ? text(first) : '';
  };
  const ownLabel = (el) => {
    if (el.id) {
      const byFor = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
      if (byFor) return text(byFor);
    }
    const wrapping = el.closest('label');
    if (wrapping) return text(wrapping);
    if (el.getAttribute('aria-label')) return el.getAttribute('aria-label').trim();
    return '';
  };
  const optionLabel = (el) => {
    if (el.matches('[role="radio"]')) return el.getAttribute('aria-label') || text(el);
    if (el.id) {
      const byFor = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
      if (byFor) return byFor;
    }
    const sibling = el.nextElementSibling;
    if (sibling && sibling.tagName === 'LABEL') return sibling;
    return el.closest('label');
  };
  const optionText = (el) => {
    const label = optionLabel(el);
    if (typeof label === 'string') return label.trim();
    return label ? text(label) : (el.value || '').trim();
  };
  const checked = (el) => el.matches('[role="radio"]') ? el.getAttribute('aria-checked') === 'true' : !!el.checked;
  const members = (group) => Array.from(group.querySelectorAll('input[type="radio"], input[type="checkbox"], [role="radio"]'));
  return { ATTR, tag, byId, visible, text, isChoice, groupKind, labelTarget, groupLabel, ownLabel,
           optionLabel, optionText, checked, members, promote };
})());
"#;

fn wrap(body: &str) -> String {
    format!("(() => {{\n{PRELUDE}\n{body}\n}})()")
}

fn literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub fn css_for(control: &ControlId) -> String {
    format!("[{ID_ATTR}={}]", literal(control.as_str()))
}

/// Ids of visible elements matching `selector`, optionally inside the first `scope` match.
pub fn find(scope: Option<&str>, selector: &str) -> String {
    let scope = scope.map(literal).unwrap_or_else(|| "null".to_string());
    wrap(&format!(
        r#"const scope = {scope};
const root = scope ? document.querySelector(scope) : document;
if (!root) return JSON.stringify([]);
return JSON.stringify(Array.from(root.querySelectorAll({selector})).filter(EA.visible).map(EA.tag));"#,
        selector = literal(selector),
    ))
}

pub fn describe(control: &ControlId) -> String {
    wrap(&format!(
        r#"const el = EA.byId({id});
if (!el) return JSON.stringify(null);
const name = el.tagName.toLowerCase();
const tag = ({{ input: 'input', textarea: 'text_area', select: 'select', button: 'button' }})[name] || 'other';
const group = EA.groupKind(el);
const label = group !== 'none' ? EA.groupLabel(el) : EA.ownLabel(el);
return JSON.stringify({{
  id: {id},
  tag,
  input_type: name === 'input' ? (el.getAttribute('type') || 'text').toLowerCase() : null,
  label,
  group,
  name: el.getAttribute('name'),
  enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true',
  visible: EA.visible(el),
}});"#,
        id = literal(control.as_str()),
    ))
}

pub fn text(control: &ControlId) -> String {
    wrap(&format!(
        r#"const el = EA.byId({id});
if (!el) return JSON.stringify(null);
return JSON.stringify(EA.text(el));"#,
        id = literal(control.as_str()),
    ))
}

pub fn label_target(label: &ControlId) -> String {
    wrap(&format!(
        r#"const label = EA.byId({id});
if (!label) return JSON.stringify(null);
return JSON.stringify(EA.tag(EA.labelTarget(label)));"#,
        id = literal(label.as_str()),
    ))
}

/// Control linked to an error indicator through `aria-describedby`, else the first
/// control inside the nearest `container` ancestor.
pub fn error_target(indicator: &ControlId, container: &str) -> String {
    wrap(&format!(
        r#"const err = EA.byId({id});
if (!err) return JSON.stringify(null);
let target = null;
if (err.id) {{
  target = Array.from(document.querySelectorAll('[aria-describedby]'))
    .find((el) => el.getAttribute('aria-describedby').split(/\s+/).includes(err.id)) || null;
}}
if (!target) {{
  const box = err.closest({container});
  if (box) {{
    if (EA.groupKind(box) !== 'none') return JSON.stringify(EA.tag(box));
    target = box.querySelector('input, textarea, select, [role="radio"]');
  }}
}}
return JSON.stringify(target ? EA.tag(EA.promote(target)) : null);"#,
        id = literal(indicator.as_str()),
        container = literal(container),
    ))
}

pub fn options(control: &ControlId) -> String {
    wrap(&format!(
        r#"const el = EA.byId({id});
if (!el) return JSON.stringify(null);
if (el.tagName === 'SELECT') {{
  return JSON.stringify(Array.from(el.options).map((opt) => ({{
    control: EA.tag(opt),
    label: (opt.text || '').trim(),
    value: opt.value,
    selected: opt.selected && opt.value !== '',
    enabled: !opt.disabled,
  }})));
}}
return JSON.stringify(EA.members(el).map((opt) => ({{
  control: EA.tag(opt),
  label: EA.optionText(opt),
  value: opt.value || EA.optionText(opt),
  selected: EA.checked(opt),
  enabled: !opt.disabled && opt.getAttribute('aria-disabled') !== 'true',
}})));"#,
        id = literal(control.as_str()),
    ))
}

pub fn current_value(control: &ControlId) -> String {
    wrap(&format!(
        r#"const el = EA.byId({id});
if (!el) return JSON.stringify(null);
let value = '';
if (EA.groupKind(el) !== 'none') {{
  value = EA.members(el).filter(EA.checked).map(EA.optionText).join(', ');
}} else if (EA.isChoice(el)) {{
  value = EA.checked(el) ? EA.optionText(el) : '';
}} else {{
  value = (el.value || '').trim();
}}
return JSON.stringify(value === '' ? null : value);"#,
        id = literal(control.as_str()),
    ))
}

pub fn clear(control: &ControlId) -> String {
    wrap(&format!(
        r#"const el = EA.byId({id});
if (!el || !('value' in el)) return JSON.stringify(false);
el.focus();
el.value = '';
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
return JSON.stringify(true);"#,
        id = literal(control.as_str()),
    ))
}

/// Sets a select's value and fires `change`; false when no option carries `value`.
pub fn select(control: &ControlId, value: &str) -> String {
    wrap(&format!(
        r#"const el = EA.byId({id});
if (!el || el.tagName !== 'SELECT') return JSON.stringify(false);
const wanted = {value};
if (!Array.from(el.options).some((opt) => opt.value === wanted)) return JSON.stringify(false);
el.value = wanted;
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return JSON.stringify(true);"#,
        id = literal(control.as_str()),
        value = literal(value),
    ))
}

/// Id of the label element for a choice input, if it has one.
pub fn option_label(control: &ControlId) -> String {
    wrap(&format!(
        r#"const el = EA.byId({id});
if (!el || !EA.isChoice(el)) return JSON.stringify(null);
const label = EA.optionLabel(el);
return JSON.stringify(label && typeof label !== 'string' ? EA.tag(label) : null);"#,
        id = literal(control.as_str()),
    ))
}

pub fn scripted_click(control: &ControlId) -> String {
    wrap(&format!(
        r#"const el = EA.byId({id});
if (!el) return JSON.stringify(false);
el.scrollIntoView({{ block: 'center' }});
el.click();
return JSON.stringify(true);"#,
        id = literal(control.as_str()),
    ))
}
