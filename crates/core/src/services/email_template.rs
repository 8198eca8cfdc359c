//! Email templates.

use std::fmt::Write as _;

/// Rendered subject and bodies.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Every notification the site sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    Confirmation {
        name: String,
        url: String,
    },
    PasswordReset {
        name: String,
        url: String,
    },
    Approval {
        name: String,
        /// "terapeut" or "business"
        kind_label: String,
        email: String,
        login_url: String,
        temp_password: Option<String>,
    },
    DocumentRequest {
        name: String,
        message: String,
        documents: Vec<String>,
    },
    Rejection {
        name: String,
        reason: Option<String>,
    },
    Reply {
        name: String,
        subject: String,
        message: String,
    },
    BookingRequest {
        provider_name: String,
        client_name: String,
        date: String,
        time: String,
        notes: Option<String>,
        dashboard_url: String,
    },
    BookingStatus {
        client_name: String,
        provider_name: String,
        date: String,
        time: String,
        /// confirmed, cancelled or completed
        status: String,
        reason: Option<String>,
        review_url: Option<String>,
    },
    BookingCancellation {
        provider_name: String,
        client_name: String,
        date: String,
        time: String,
        reason: Option<String>,
    },
    NewMessage {
        recipient_name: String,
        sender_name: String,
        preview: String,
        url: String,
    },
    ContactNotification {
        name: String,
        email: String,
        subject: String,
        message: String,
    },
}

/// Escape text for inclusion in HTML.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn paragraphs(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

fn button(url: &str, label: &str) -> String {
    format!(
        r#"<p><a href="{}" style="display:inline-block;padding:10px 20px;background:#0f766e;color:#fff;border-radius:6px;text-decoration:none">{}</a></p>"#,
        escape_html(url),
        escape_html(label)
    )
}

impl EmailTemplate {
    /// Template name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Confirmation { .. } => "confirmation",
            Self::PasswordReset { .. } => "password_reset",
            Self::Approval { .. } => "approval",
            Self::DocumentRequest { .. } => "document_request",
            Self::Rejection { .. } => "rejection",
            Self::Reply { .. } => "reply",
            Self::BookingRequest { .. } => "booking_request",
            Self::BookingStatus { .. } => "booking_status",
            Self::BookingCancellation { .. } => "booking_cancellation",
            Self::NewMessage { .. } => "new_message",
            Self::ContactNotification { .. } => "contact_notification",
        }
    }

    /// Render subject, text and HTML.
    #[must_use]
    pub fn render(&self, site_name: &str, site_url: &str) -> RenderedEmail {
        let (subject, text, html) = match self {
            Self::Confirmation { name, url } => (
                format!("Confirmă-ți adresa de email - {site_name}"),
                format!(
                    "Bună {name},\n\nConfirmă-ți contul accesând linkul de mai jos:\n{url}\n\nDacă nu tu ai creat contul, ignoră acest mesaj."
                ),
                format!(
                    "<h2>Bună {},</h2><p>Confirmă-ți contul apăsând butonul de mai jos.</p>{}<p>Dacă nu tu ai creat contul, ignoră acest mesaj.</p>",
                    escape_html(name),
                    button(url, "Confirmă email")
                ),
            ),
            Self::PasswordReset { name, url } => (
                format!("Resetare parolă - {site_name}"),
                format!(
                    "Bună {name},\n\nAm primit o cerere de resetare a parolei. Setează o parolă nouă aici:\n{url}\n\nLinkul expiră în curând. Dacă nu ai cerut resetarea, ignoră acest mesaj."
                ),
                format!(
                    "<h2>Bună {},</h2><p>Am primit o cerere de resetare a parolei.</p>{}<p>Dacă nu ai cerut resetarea, ignoră acest mesaj.</p>",
                    escape_html(name),
                    button(url, "Setează parola nouă")
                ),
            ),
            Self::Approval {
                name,
                kind_label,
                email,
                login_url,
                temp_password,
            } => {
                let mut text = format!(
                    "Felicitări {name}!\n\nCererea ta de înscriere ca {kind_label} a fost aprobată.\n\nTe poți autentifica aici: {login_url}\nEmail: {email}\n"
                );
                let mut html = format!(
                    "<h2>Felicitări {}!</h2><p>Cererea ta de înscriere ca {} a fost aprobată.</p><p>Email: <strong>{}</strong></p>",
                    escape_html(name),
                    escape_html(kind_label),
                    escape_html(email)
                );
                if let Some(password) = temp_password {
                    let _ = write!(
                        text,
                        "Parolă temporară: {password}\n\nLa prima autentificare vei fi rugat să o schimbi.\n"
                    );
                    let _ = write!(
                        html,
                        "<p>Parolă temporară: <code>{}</code></p><p>La prima autentificare vei fi rugat să o schimbi.</p>",
                        escape_html(password)
                    );
                }
                html.push_str(&button(login_url, "Autentificare"));
                (
                    format!("Contul tău {site_name} a fost aprobat"),
                    text,
                    html,
                )
            }
            Self::DocumentRequest {
                name,
                message,
                documents,
            } => {
                let list_text: String = documents.iter().map(|d| format!("- {d}\n")).collect();
                let list_html: String = documents
                    .iter()
                    .map(|d| format!("<li>{}</li>", escape_html(d)))
                    .collect();
                (
                    format!("Documente necesare pentru înscrierea pe {site_name}"),
                    format!(
                        "Bună {name},\n\n{message}\n\nTe rugăm să ne trimiți următoarele documente:\n{list_text}\nRăspunde la acest email cu documentele atașate."
                    ),
                    format!(
                        "<h2>Bună {},</h2><p>{}</p><p>Te rugăm să ne trimiți următoarele documente:</p><ul>{}</ul><p>Răspunde la acest email cu documentele atașate.</p>",
                        escape_html(name),
                        paragraphs(message),
                        list_html
                    ),
                )
            }
            Self::Rejection { name, reason } => {
                let reason_text = reason
                    .as_deref()
                    .map(|r| format!("\nMotiv: {r}\n"))
                    .unwrap_or_default();
                let reason_html = reason
                    .as_deref()
                    .map(|r| format!("<p>Motiv: {}</p>", paragraphs(r)))
                    .unwrap_or_default();
                (
                    format!("Actualizare privind cererea ta pe {site_name}"),
                    format!(
                        "Bună {name},\n\nÎn urma analizei, cererea ta de înscriere nu a fost aprobată.\n{reason_text}\nNe poți contacta pentru detalii."
                    ),
                    format!(
                        "<h2>Bună {},</h2><p>În urma analizei, cererea ta de înscriere nu a fost aprobată.</p>{}<p>Ne poți contacta pentru detalii.</p>",
                        escape_html(name),
                        reason_html
                    ),
                )
            }
            Self::Reply {
                name,
                subject,
                message,
            } => (
                subject.clone(),
                format!("Bună {name},\n\n{message}\n\nEchipa {site_name}"),
                format!(
                    "<h2>Bună {},</h2><p>{}</p><p>Echipa {}</p>",
                    escape_html(name),
                    paragraphs(message),
                    escape_html(site_name)
                ),
            ),
            Self::BookingRequest {
                provider_name,
                client_name,
                date,
                time,
                notes,
                dashboard_url,
            } => {
                let notes_text = notes
                    .as_deref()
                    .map(|n| format!("Note: {n}\n"))
                    .unwrap_or_default();
                let notes_html = notes
                    .as_deref()
                    .map(|n| format!("<blockquote>{}</blockquote>", paragraphs(n)))
                    .unwrap_or_default();
                (
                    format!("Cerere nouă de programare de la {client_name}"),
                    format!(
                        "Bună {provider_name},\n\n{client_name} a solicitat o programare pe {date} la ora {time}.\n{notes_text}\nConfirmă sau refuză cererea din panoul tău: {dashboard_url}"
                    ),
                    format!(
                        "<h2>Bună {},</h2><p><strong>{}</strong> a solicitat o programare pe <strong>{}</strong> la ora <strong>{}</strong>.</p>{}{}",
                        escape_html(provider_name),
                        escape_html(client_name),
                        escape_html(date),
                        escape_html(time),
                        notes_html,
                        button(dashboard_url, "Vezi programarea")
                    ),
                )
            }
            Self::BookingStatus {
                client_name,
                provider_name,
                date,
                time,
                status,
                reason,
                review_url,
            } => {
                let (subject, headline) = match status.as_str() {
                    "confirmed" => ("Programarea ta a fost confirmată", "a confirmat"),
                    "completed" => ("Cum a fost ședința?", "a marcat ca finalizată"),
                    _ => ("Programarea ta a fost anulată", "a anulat"),
                };
                let mut text = format!(
                    "Bună {client_name},\n\n{provider_name} {headline} programarea din {date}, ora {time}.\n"
                );
                let mut html = format!(
                    "<h2>Bună {},</h2><p><strong>{}</strong> {} programarea din <strong>{}</strong>, ora <strong>{}</strong>.</p>",
                    escape_html(client_name),
                    escape_html(provider_name),
                    headline,
                    escape_html(date),
                    escape_html(time)
                );
                if let Some(reason) = reason {
                    let _ = writeln!(text, "Motiv: {reason}");
                    let _ = write!(html, "<blockquote>{}</blockquote>", paragraphs(reason));
                }
                if let Some(url) = review_url {
                    let _ = write!(text, "\nLasă o recenzie: {url}\n");
                    html.push_str(&button(url, "Lasă o recenzie"));
                }
                (subject.to_string(), text, html)
            }
            Self::BookingCancellation {
                provider_name,
                client_name,
                date,
                time,
                reason,
            } => {
                let reason_text = reason
                    .as_deref()
                    .map(|r| format!("Motiv: {r}\n"))
                    .unwrap_or_default();
                let reason_html = reason
                    .as_deref()
                    .map(|r| format!("<blockquote>{}</blockquote>", paragraphs(r)))
                    .unwrap_or_default();
                (
                    format!("{client_name} a anulat programarea"),
                    format!(
                        "Bună {provider_name},\n\n{client_name} a anulat programarea din {date}, ora {time}.\n{reason_text}"
                    ),
                    format!(
                        "<h2>Bună {},</h2><p><strong>{}</strong> a anulat programarea din <strong>{}</strong>, ora <strong>{}</strong>.</p>{}",
                        escape_html(provider_name),
                        escape_html(client_name),
                        escape_html(date),
                        escape_html(time),
                        reason_html
                    ),
                )
            }
            Self::NewMessage {
                recipient_name,
                sender_name,
                preview,
                url,
            } => (
                format!("Mesaj nou de la {sender_name}"),
                format!(
                    "Bună {recipient_name},\n\nAi primit un mesaj nou de la {sender_name}:\n\n\"{preview}\"\n\nRăspunde aici: {url}"
                ),
                format!(
                    "<h2>Bună {},</h2><p>Ai primit un mesaj nou de la <strong>{}</strong>:</p><blockquote>{}</blockquote>{}",
                    escape_html(recipient_name),
                    escape_html(sender_name),
                    paragraphs(preview),
                    button(url, "Răspunde")
                ),
            ),
            Self::ContactNotification {
                name,
                email,
                subject,
                message,
            } => (
                format!("[Contact] {subject}"),
                format!("Mesaj nou din formularul de contact\n\nDe la: {name} <{email}>\nSubiect: {subject}\n\n{message}"),
                format!(
                    "<h2>Mesaj nou din formularul de contact</h2><p>De la: <strong>{}</strong> &lt;{}&gt;</p><p>Subiect: {}</p><blockquote>{}</blockquote>",
                    escape_html(name),
                    escape_html(email),
                    escape_html(subject),
                    paragraphs(message)
                ),
            ),
        };

        RenderedEmail {
            subject,
            text_body: text,
            html_body: wrap_html(&html, site_name, site_url),
        }
    }
}

fn wrap_html(content: &str, site_name: &str, site_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        a {{ color: #0f766e; }}
        blockquote {{ margin: 10px 0; padding: 10px 20px; border-left: 4px solid #e9ecef; background: #f8f9fa; }}
    </style>
</head>
<body>
    {content}
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">
        Acest email a fost trimis de <a href="{url}">{name}</a>.<br>
        Poți gestiona notificările din setările contului.
    </p>
</body>
</html>"#,
        url = escape_html(site_url),
        name = escape_html(site_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_approval_includes_temp_password() {
        let rendered = EmailTemplate::Approval {
            name: "Dr. Pop".to_string(),
            kind_label: "terapeut".to_string(),
            email: "pop@example.com".to_string(),
            login_url: "https://terapie.ro/auth/login".to_string(),
            temp_password: Some("Abc123xyz789".to_string()),
        }
        .render("Terapie", "https://terapie.ro");

        assert!(rendered.text_body.contains("Abc123xyz789"));
        assert!(rendered.html_body.contains("Abc123xyz789"));
        assert!(rendered.html_body.contains("https://terapie.ro/auth/login"));
    }

    #[test]
    fn test_approval_without_password() {
        let rendered = EmailTemplate::Approval {
            name: "Spa".to_string(),
            kind_label: "business".to_string(),
            email: "spa@example.com".to_string(),
            login_url: "https://terapie.ro/auth/login".to_string(),
            temp_password: None,
        }
        .render("Terapie", "https://terapie.ro");

        assert!(!rendered.text_body.contains("temporară"));
    }

    #[test]
    fn test_booking_status_completed_invites_review() {
        let rendered = EmailTemplate::BookingStatus {
            client_name: "Ana".to_string(),
            provider_name: "Dr. Pop".to_string(),
            date: "2030-01-07".to_string(),
            time: "09:00".to_string(),
            status: "completed".to_string(),
            reason: None,
            review_url: Some("https://terapie.ro/review/b1".to_string()),
        }
        .render("Terapie", "https://terapie.ro");

        assert!(rendered.text_body.contains("https://terapie.ro/review/b1"));
        assert_eq!(rendered.subject, "Cum a fost ședința?");
    }

    #[test]
    fn test_user_content_is_escaped() {
        let rendered = EmailTemplate::NewMessage {
            recipient_name: "Ana".to_string(),
            sender_name: "<b>Eve</b>".to_string(),
            preview: "<img src=x>".to_string(),
            url: "https://terapie.ro/bookings/b1".to_string(),
        }
        .render("Terapie", "https://terapie.ro");

        assert!(!rendered.html_body.contains("<img src=x>"));
        assert!(rendered.html_body.contains("&lt;b&gt;Eve&lt;/b&gt;"));
    }

    #[test]
    fn test_document_request_lists_documents() {
        let rendered = EmailTemplate::DocumentRequest {
            name: "Ion".to_string(),
            message: "Mai avem nevoie de câteva acte.".to_string(),
            documents: vec!["Diplomă".to_string(), "Aviz CPR".to_string()],
        }
        .render("Terapie", "https://terapie.ro");

        assert!(rendered.text_body.contains("- Diplomă\n"));
        assert!(rendered.html_body.contains("<li>Aviz CPR</li>"));
    }
}
