mod mailgun;
mod postal_client;
mod sendgrid;
