use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use chrono::{FixedOffset, TimeZone};
use empath_mailer::{
    transport, Auth, ClientError, Error, ServerProfile, Transport, DEFAULT_BOUNDARY,
};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone)]
struct Delivery {
    addr: String,
    auth: Auth,
    from: String,
    recipients: Vec<String>,
    message: Vec<u8>,
}

/// Records deliveries instead of talking to a relay.
#[derive(Clone, Default)]
struct Recorder {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    refuse_auth: bool,
}

impl Recorder {
    fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl Transport for Recorder {
    fn send_mail(
        &self,
        addr: &str,
        auth: &Auth,
        from: &str,
        recipients: &[String],
        message: &[u8],
    ) -> transport::Result<()> {
        if self.refuse_auth {
            return Err(ClientError::AuthRejected {
                mechanism: auth.mechanism(),
                code: 535,
                message: "Authentication credentials invalid".to_string(),
            });
        }

        self.deliveries.lock().unwrap().push(Delivery {
            addr: addr.to_string(),
            auth: auth.clone(),
            from: from.to_string(),
            recipients: recipients.to_vec(),
            message: message.to_vec(),
        });
        Ok(())
    }
}

fn plain_profile(recorder: &Recorder) -> ServerProfile {
    ServerProfile::plain("smtp.example.com", 587, "u", "p").with_transport(recorder.clone())
}

#[test]
fn test_plain_delivery() {
    let recorder = Recorder::default();
    let profile = plain_profile(&recorder);

    let mut message = profile.new_message("Hi", "Test");
    message.set_from("a@x.com").unwrap();
    message.add_to("b@y.com").unwrap();
    message.send().unwrap();

    let deliveries = recorder.deliveries();
    assert_eq!(deliveries.len(), 1);

    let delivery = &deliveries[0];
    assert_eq!(delivery.addr, "smtp.example.com:587");
    assert_eq!(delivery.auth, Auth::plain("", "u", "p", "smtp.example.com"));
    assert_eq!(delivery.from, "a@x.com");
    assert_eq!(delivery.recipients, vec!["b@y.com"]);

    let text = String::from_utf8(delivery.message.clone()).unwrap();
    assert!(text.starts_with("From: <a@x.com>\r\nDate: "));
    assert!(text.contains("\r\nTo: <b@y.com>\r\n"));
    assert!(text.contains("\r\nSubject: =?UTF-8?B?SGk=?=\r\n"));
    assert!(text.ends_with("Content-Type: text/plain; charset=utf-8\r\n\r\nTest\r\n"));
}

#[test]
fn test_cram_md5_delivery() {
    let recorder = Recorder::default();
    let profile =
        ServerProfile::cram_md5("smtp.example.com", 587, "u", "s").with_transport(recorder.clone());

    profile
        .easy_send("Me <a@x.com>", "b@y.com, c@y.com", "Hi", "Test")
        .unwrap();

    let deliveries = recorder.deliveries();
    assert_eq!(deliveries[0].auth, Auth::cram_md5("u", "s"));
    assert_eq!(deliveries[0].from, "a@x.com");
    assert_eq!(deliveries[0].recipients, vec!["b@y.com", "c@y.com"]);
}

#[test]
fn test_envelope_includes_all_recipients() {
    let recorder = Recorder::default();
    let profile = plain_profile(&recorder);

    let mut message = profile.new_message("Hi", "Test");
    message.set_from("a@x.com").unwrap();
    message.add_bcc("secret@z.com").unwrap();
    message.add_cc("C <c@y.com>").unwrap();
    message.add_to("b@y.com").unwrap();
    message.send().unwrap();

    let delivery = &recorder.deliveries()[0];
    assert_eq!(
        delivery.recipients,
        vec!["b@y.com", "c@y.com", "secret@z.com"]
    );

    let text = String::from_utf8(delivery.message.clone()).unwrap();
    assert!(text.contains("\r\nCc: \"C\" <c@y.com>\r\n"));
    assert!(!text.contains("secret@z.com"));
}

#[test]
fn test_local_failures_never_reach_the_transport() {
    let recorder = Recorder::default();
    let profile = plain_profile(&recorder);
    let dir = tempfile::tempdir().unwrap();

    let mut no_sender = profile.new_message("Hi", "Test");
    no_sender.add_to("b@y.com").unwrap();
    assert!(matches!(no_sender.send(), Err(Error::MissingSender)));

    let mut no_recipient = profile.new_message("Hi", "Test");
    no_recipient.set_from("a@x.com").unwrap();
    no_recipient.add_bcc("hidden@y.com").unwrap();
    assert!(matches!(no_recipient.send(), Err(Error::MissingRecipient)));

    let mut missing_file = profile.new_message("Hi", "Test");
    missing_file.set_from("a@x.com").unwrap();
    missing_file.add_to("b@y.com").unwrap();
    missing_file.attach(dir.path().join("gone.pdf"));
    let err = missing_file.send().unwrap_err();
    assert!(matches!(err, Error::MissingAttachment { .. }));
    assert!(err.is_local());

    let mut unreadable = profile.new_message("Hi", "Test");
    unreadable.set_from("a@x.com").unwrap();
    unreadable.add_to("b@y.com").unwrap();
    unreadable.attach(dir.path());
    assert!(matches!(unreadable.send(), Err(Error::Io { .. })));

    assert!(matches!(
        profile.easy_send("not an address", "b@y.com", "Hi", "Test"),
        Err(Error::MalformedAddress { field: "from", .. })
    ));

    assert!(recorder.deliveries().is_empty());
}

#[test]
fn test_auth_refusal_maps_to_auth_error() {
    let recorder = Recorder {
        refuse_auth: true,
        ..Recorder::default()
    };
    let profile = plain_profile(&recorder);

    let err = profile
        .easy_send("a@x.com", "b@y.com", "Hi", "Test")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Auth(ClientError::AuthRejected { code: 535, .. })
    ));
    assert!(!err.is_local());
}

#[test]
fn test_profile_is_reusable() {
    let recorder = Recorder::default();
    let profile = plain_profile(&recorder);

    for to in ["b@y.com", "c@y.com"] {
        profile.easy_send("a@x.com", to, "Hi", "Test").unwrap();
    }

    let recipients: Vec<_> = recorder
        .deliveries()
        .into_iter()
        .flat_map(|d| d.recipients)
        .collect();
    assert_eq!(recipients, vec!["b@y.com", "c@y.com"]);
}

#[test]
fn test_profile_is_shareable_between_threads() {
    let recorder = Recorder::default();
    let profile = Arc::new(plain_profile(&recorder));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let profile = Arc::clone(&profile);
            std::thread::spawn(move || {
                profile
                    .easy_send("a@x.com", &format!("user{i}@y.com"), "Hi", "Test")
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(recorder.deliveries().len(), 4);
}

#[test]
fn test_full_message_with_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"File content")
        .unwrap();

    let profile = ServerProfile::plain("smtp.example.com", 587, "u", "p");
    let mut message = profile.new_html_message("Résumé", "<p>See attached</p>");
    message.set_from("Jürgen <j@x.com>").unwrap();
    message.add_to("b@y.com").unwrap();
    message.set_reply_to("r@x.com").unwrap();
    message.add_header("X-Mailer", "empath").unwrap();
    message.set_boundary(DEFAULT_BOUNDARY);
    message.attach(&path);

    let date = FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
        .unwrap();
    let rendered = String::from_utf8(message.render(&date).unwrap()).unwrap();

    assert_eq!(
        rendered,
        "From: =?UTF-8?B?SsO8cmdlbg==?= <j@x.com>\r\n\
         Date: Fri, 01 Mar 2024 09:30:00 +0100\r\n\
         To: <b@y.com>\r\n\
         Subject: =?UTF-8?B?UsOpc3Vtw6k=?=\r\n\
         Reply-To: <r@x.com>\r\n\
         X-Mailer: empath\r\n\
         Content-Type: multipart/mixed; boundary=0141caffe046497\r\n\
         \r\n\
         --0141caffe046497\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         \r\n\
         <p>See attached</p>\r\n\
         \r\n\
         --0141caffe046497\r\n\
         Content-Type: text/plain\r\n\
         Content-Transfer-Encoding: base64\r\n\
         Content-Disposition: attachment; filename=\"=?UTF-8?B?bm90ZXMudHh0?=\"\r\n\
         \r\n\
         RmlsZSBjb250ZW50\r\n\
         --0141caffe046497--\r\n"
    );
}
