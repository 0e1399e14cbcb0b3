//! Built-in CV templates.
//!
//! Each template renders against the mapped employee data and uses the
//! `.cv-*` classes emitted by the stylesheet generator.

/// Names accepted by [`builtin`].
pub const BUILTIN_NAMES: &[&str] = &["classic", "sidebar", "minimal"];

/// Look up a built-in template by name.
pub fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "classic" => Some(classic()),
        "sidebar" => Some(sidebar()),
        "minimal" => Some(minimal()),
        _ => None,
    }
}

/// Single-column layout: header, summary, then one section per list.
pub fn classic() -> &'static str {
    r##"<header class="cv-header">
  {{#if profile_image}}<img class="cv-photo" src="{{profile_image}}" alt="{{full_name}}">{{/if}}
  <div>
    <h1 class="cv-name">{{full_name}}</h1>
    {{#if designation}}<p class="cv-title">{{designation}}</p>{{/if}}
    <p class="cv-contact">{{#if email}}<span>{{email}}</span>{{/if}}{{#if phone}}<span>{{phone}}</span>{{/if}}{{#if location}}<span>{{location}}</span>{{/if}}</p>
  </div>
</header>
{{#if biography}}
<section class="cv-section">
  <h2 class="cv-section-title">Profile</h2>
  <p>{{biography}}</p>
</section>
{{/if}}
<section class="cv-section">
  <h2 class="cv-section-title">Experience</h2>
  {{#each experiences}}
  <div class="cv-item">
    <div class="cv-item-header">
      <span class="cv-item-title">{{designation}}</span>
      <span class="cv-item-meta">{{period}}</span>
    </div>
    <div class="cv-item-subtitle">{{company_name}}</div>
    {{#if description}}<p class="cv-item-body">{{description}}</p>{{/if}}
  </div>
  {{else}}
  <p class="cv-empty">No experience listed.</p>
  {{/each}}
</section>
{{#if has_educations}}
<section class="cv-section">
  <h2 class="cv-section-title">Education</h2>
  {{#each educations}}
  <div class="cv-item">
    <div class="cv-item-header">
      <span class="cv-item-title">{{degree}}</span>
      <span class="cv-item-meta">{{period}}</span>
    </div>
    <div class="cv-item-subtitle">{{university}}{{#if department}}, {{department}}{{/if}}</div>
    {{#if gpa}}<p class="cv-item-body">GPA {{gpa}}</p>{{/if}}
  </div>
  {{/each}}
</section>
{{/if}}
{{#if has_skills}}
<section class="cv-section">
  <h2 class="cv-section-title">Skills</h2>
  <div class="cv-skills">
    {{#each skills}}
    <div class="cv-skill">
      <span class="cv-skill-name">{{name}}</span>
      <div class="cv-skill-bar"><div class="cv-skill-level" style="width: {{level_percent}}%"></div></div>
    </div>
    {{/each}}
  </div>
</section>
{{/if}}
{{#if has_projects}}
<section class="cv-section">
  <h2 class="cv-section-title">Projects</h2>
  {{#each projects}}
  <div class="cv-item">
    <div class="cv-item-header">
      <span class="cv-item-title">{{name}}</span>
      <span class="cv-item-meta">{{period}}</span>
    </div>
    {{#if role}}<div class="cv-item-subtitle">{{role}}</div>{{/if}}
    {{#if description}}<p class="cv-item-body">{{description}}</p>{{/if}}
    {{#if technologies}}<div class="cv-tags">{{#each technologies}}<span class="cv-tag">{{this}}</span>{{/each}}</div>{{/if}}
  </div>
  {{/each}}
</section>
{{/if}}
{{#if has_trainings}}
<section class="cv-section">
  <h2 class="cv-section-title">Training</h2>
  {{#each trainings}}
  <div class="cv-item">
    <div class="cv-item-header">
      <span class="cv-item-title">{{title}}</span>
      <span class="cv-item-meta">{{#if certification_date}}{{certification_date}}{{else}}{{period}}{{/if}}</span>
    </div>
    {{#if provider}}<div class="cv-item-subtitle">{{provider}}</div>{{/if}}
  </div>
  {{/each}}
</section>
{{/if}}
{{#if has_achievements}}
<section class="cv-section">
  <h2 class="cv-section-title">Achievements</h2>
  {{#each achievements}}
  <div class="cv-item">
    <div class="cv-item-header">
      <span class="cv-item-title">{{name}}</span>
      <span class="cv-item-meta">{{date}}</span>
    </div>
    {{#if description}}<p class="cv-item-body">{{description}}</p>{{/if}}
  </div>
  {{/each}}
</section>
{{/if}}
"##
}

/// Two-column layout. Pair with `columns: 2` in the layout config.
pub fn sidebar() -> &'static str {
    r##"<div class="cv-grid">
  <aside class="cv-sidebar">
    {{#if profile_image}}<img class="cv-photo" src="{{profile_image}}" alt="{{initials}}">{{/if}}
    <section class="cv-section">
      <h2 class="cv-section-title">Contact</h2>
      {{#if email}}<p>{{email}}</p>{{/if}}
      {{#if phone}}<p>{{phone}}</p>{{/if}}
      {{#if location}}<p>{{location}}</p>{{/if}}
    </section>
    {{#if technical_skills}}
    <section class="cv-section">
      <h2 class="cv-section-title">Technical Skills</h2>
      <div class="cv-skills">
        {{#each technical_skills}}
        <div class="cv-skill">
          <span class="cv-skill-name">{{name}}</span>
          <div class="cv-skill-bar"><div class="cv-skill-level" style="width: {{level_percent}}%"></div></div>
        </div>
        {{/each}}
      </div>
    </section>
    {{/if}}
    {{#if specialized_skills}}
    <section class="cv-section">
      <h2 class="cv-section-title">Specialized Skills</h2>
      <div class="cv-tags">{{#each specialized_skills}}<span class="cv-tag">{{name}}</span>{{/each}}</div>
    </section>
    {{/if}}
  </aside>
  <main class="cv-main">
    <header class="cv-header">
      <div>
        <h1 class="cv-name">{{full_name}}</h1>
        {{#if designation}}<p class="cv-title">{{designation}}</p>{{/if}}
        {{#if total_experience_years}}<p class="cv-contact">{{total_experience_years}} years of experience</p>{{/if}}
      </div>
    </header>
    {{#if biography}}<section class="cv-section"><p>{{biography}}</p></section>{{/if}}
    <section class="cv-section">
      <h2 class="cv-section-title">Experience</h2>
      {{#each experiences}}
      <div class="cv-item">
        <div class="cv-item-header">
          <span class="cv-item-title">{{designation}}, {{company_name}}</span>
          <span class="cv-item-meta">{{period}}</span>
        </div>
        {{#if description}}<p class="cv-item-body">{{description}}</p>{{/if}}
      </div>
      {{else}}
      <p class="cv-empty">No experience listed.</p>
      {{/each}}
    </section>
    {{#if has_educations}}
    <section class="cv-section">
      <h2 class="cv-section-title">Education</h2>
      {{#each educations}}
      <div class="cv-item">
        <div class="cv-item-header">
          <span class="cv-item-title">{{degree}}</span>
          <span class="cv-item-meta">{{period}}</span>
        </div>
        <div class="cv-item-subtitle">{{university}}</div>
      </div>
      {{/each}}
    </section>
    {{/if}}
    {{#if has_projects}}
    <section class="cv-section">
      <h2 class="cv-section-title">Projects</h2>
      {{#each projects}}
      <div class="cv-item">
        <span class="cv-item-title">{{name}}</span>
        {{#if technologies_text}}<span class="cv-item-meta">{{technologies_text}}</span>{{/if}}
        {{#if description}}<p class="cv-item-body">{{description}}</p>{{/if}}
      </div>
      {{/each}}
    </section>
    {{/if}}
  </main>
</div>
"##
}

/// Plain text-first layout without skill bars or photos.
pub fn minimal() -> &'static str {
    r##"<h1 class="cv-name">{{full_name}}</h1>
{{#if designation}}<p class="cv-title">{{designation}}</p>{{/if}}
{{#each experiences}}
<p class="cv-item">{{@number}}. {{designation}} at {{company_name}} ({{period}})</p>
{{/each}}
{{#if has_skills}}<p class="cv-skills">{{#each skills}}{{name}}{{#unless @last}}, {{/unless}}{{/each}}</p>{{/if}}
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MappedEmployeeData;
    use crate::template::Template;

    #[test]
    fn builtins_parse() {
        for name in BUILTIN_NAMES {
            let source = builtin(name).unwrap();
            let template = Template::parse(source).unwrap_or_else(|e| panic!("{name}: {e}"));
            for field in template.root_fields() {
                assert!(
                    MappedEmployeeData::KEYS.contains(&field.as_str()),
                    "{name} references unknown field {field}"
                );
            }
        }
    }

    #[test]
    fn unknown_builtin() {
        assert!(builtin("fancy").is_none());
    }
}
