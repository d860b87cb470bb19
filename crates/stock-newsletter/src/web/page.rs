//! HTML rendering for the research page

use super::submission::Submission;
use crate::error::Result;
use minijinja::{Environment, context};

const PAGE: &str = "research.html";

const PAGE_SOURCE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Stock Newsletter</title>
<style>
  body { display: flex; margin: 0; font-family: sans-serif; }
  aside { width: 18rem; min-height: 100vh; padding: 1.5rem; background: #f0f2f6; }
  main { flex: 1; padding: 1.5rem 3rem; }
  input, button { display: block; width: 100%; margin-top: 0.5rem; padding: 0.4rem; }
  .error { padding: 0.8rem; color: #7d353b; background: #ffe9e9; border-radius: 0.3rem; }
  .newsletter { white-space: pre-wrap; font-family: inherit; }
</style>
</head>
<body>
<aside>
  <h2>Enter the ticket of the stock</h2>
  <form method="post" action="/research">
    <label for="ticker">Select the ticket</label>
    <input id="ticker" name="ticker" type="text" value="{{ ticker }}">
    <button type="submit">Run Research</button>
  </form>
</aside>
<main>
{%- if error %}
  <div class="error">{{ error }}</div>
{%- endif %}
{%- if result %}
  <h3>Results of your research:</h3>
  <pre class="newsletter">{{ result }}</pre>
{%- endif %}
</main>
</body>
</html>
"#;

/// Page templates, auto-escaped
#[derive(Debug)]
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(PAGE, PAGE_SOURCE)?;
        Ok(Self { env })
    }

    /// Render the form, plus the outcome of a submission when there is one
    pub fn render(&self, ticker: &str, submission: Option<&Submission>) -> Result<String> {
        let (error, result) = match submission {
            Some(Submission::Invalid(message) | Submission::Failed(message)) => {
                (Some(message.as_str()), None)
            }
            Some(Submission::Completed(output)) => (None, Some(output.as_str())),
            None => (None, None),
        };

        let page = self.env.get_template(PAGE)?;
        Ok(page.render(context! { ticker, error, result })?)
    }
}
