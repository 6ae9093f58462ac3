use crate::error::{Error, Result};
use handlebars::Handlebars;

pub const DEPLOYMENT_SCRIPT: &str = "deployment_script";

// `commands` is inserted as a value, never parsed as a template. Block tags
// share lines with text so no standalone-line whitespace stripping applies.
const DEPLOYMENT_SCRIPT_TEMPLATE: &str = "\
# generated by deployment script, do not modify
cd {{site_dir}}
git pull origin $FORGE_SITE_BRANCH
{{commands}}{{#each daemon_ids}}
sudo -S supervisorctl restart daemon-{{this}}:*{{/each}}
";

pub fn create_new_handlebars<'b>() -> Result<Handlebars<'b>> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(str::to_string);
    handlebars.set_strict_mode(true);
    register_templates(&mut handlebars)?;

    Ok(handlebars)
}

fn register_templates(handlebars: &mut Handlebars<'_>) -> Result<()> {
    handlebars
        .register_template_string(DEPLOYMENT_SCRIPT, DEPLOYMENT_SCRIPT_TEMPLATE)
        .map_err(|e| Error::config(format!("register deployment script template: {e}")))
}
