//! HTML for the three intake pages.

use crate::upload::ALLOWED_EXTENSIONS;

const WRITING_STYLES: &[(&str, &str)] = &[
    ("cursive", "Cursive"),
    ("print", "Print"),
    ("mixed", "Mixed"),
];

const HANDEDNESS: &[(&str, &str)] = &[
    ("right", "Right-handed"),
    ("left", "Left-handed"),
    ("ambidextrous", "Ambidextrous"),
];

const AGE_GROUPS: &[(&str, &str)] = &[
    ("under-18", "Under 18"),
    ("18-25", "18-25"),
    ("26-35", "26-35"),
    ("36-50", "36-50"),
    ("over-50", "Over 50"),
];

const GENDERS: &[(&str, &str)] = &[
    ("female", "Female"),
    ("male", "Male"),
    ("other", "Other"),
    ("prefer-not-to-say", "Prefer not to say"),
];

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <main>\n\
         <h1>{title}</h1>\n\
         {body}\
         </main>\n\
         </body>\n\
         </html>\n"
    )
}

fn select(name: &str, label: &str, options: &[(&str, &str)]) -> String {
    let mut html = format!(
        "<p><label for=\"{name}\">{label}</label>\n\
         <select id=\"{name}\" name=\"{name}\" required>\n\
         <option value=\"\" disabled selected>Choose one</option>\n"
    );
    for (value, text) in options {
        html.push_str(&format!("<option value=\"{value}\">{text}</option>\n"));
    }
    html.push_str("</select></p>\n");
    html
}

/// The questionnaire page served at `/`.
#[must_use]
pub fn questionnaire() -> String {
    let mut form = String::from(
        "<p>Tell us a little about your handwriting before uploading a sample.</p>\n\
         <form method=\"post\" action=\"/\">\n",
    );
    form.push_str(&select("writing_style", "Writing style", WRITING_STYLES));
    form.push_str(&select("handedness", "Handedness", HANDEDNESS));
    form.push_str(&select("age_group", "Age group", AGE_GROUPS));
    form.push_str(&select("gender", "Gender", GENDERS));
    form.push_str("<p><button type=\"submit\">Continue</button></p>\n</form>\n");
    layout("Handwriting Sample", &form)
}

/// The upload page served at `/upload`.
#[must_use]
pub fn upload() -> String {
    let accept = ALLOWED_EXTENSIONS.join(",");
    let body = format!(
        "<p>Upload a clear photo of your handwriting (PNG or JPEG, up to 6MB).</p>\n\
         <form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
         <p><input type=\"file\" name=\"photo\" accept=\"{accept}\" required></p>\n\
         <p><button type=\"submit\">Upload</button></p>\n\
         </form>\n"
    );
    layout("Upload Your Sample", &body)
}

/// The confirmation page served at `/thankyou`.
#[must_use]
pub fn thank_you(count: usize) -> String {
    let noun = if count == 1 { "sample" } else { "samples" };
    let body = format!(
        "<p>Your sample has been received.</p>\n\
         <p>We now have <strong id=\"count\">{count}</strong> {noun} in total.</p>\n\
         <p><a href=\"/\">Submit another</a></p>\n"
    );
    layout("Thank You", &body)
}
