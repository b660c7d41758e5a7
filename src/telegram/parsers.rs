use rust_tdlib::types::{File as TdFile, FormattedText, Message, MessageContent};

use super::{Attachment, AttachmentKind, ChannelMessage, RemoteFile};

pub fn parse_message(message: &Message) -> ChannelMessage {
    let (text, attachment) = parse_message_content(message.content());
    ChannelMessage {
        id: message.id(),
        date: message.date() as i64,
        text: text.filter(|t| !t.trim().is_empty()),
        attachment,
    }
}

fn parse_message_content(content: &MessageContent) -> (Option<String>, Option<Attachment>) {
    match content {
        MessageContent::MessageText(text) => (Some(plain_text(text.text())), None),
        MessageContent::MessagePhoto(photo) => {
            let largest = photo.photo().sizes().iter().last();
            let attachment = largest.map(|size| Attachment {
                kind: AttachmentKind::Photo,
                file: remote_file(size.photo()),
                mime_type: Some("image/jpeg".to_string()),
                file_name: None,
                thumbnail: None,
            });
            (Some(plain_text(photo.caption())), attachment)
        }
        MessageContent::MessageVideo(video) => {
            let v = video.video();
            let attachment = Attachment {
                kind: AttachmentKind::Video,
                file: remote_file(v.video()),
                mime_type: non_empty(v.mime_type()),
                file_name: non_empty(v.file_name()),
                thumbnail: v.thumbnail().as_ref().map(|t| remote_file(t.file())),
            };
            (Some(plain_text(video.caption())), Some(attachment))
        }
        MessageContent::MessageDocument(document) => {
            let d = document.document();
            let attachment = Attachment {
                kind: AttachmentKind::Document,
                file: remote_file(d.document()),
                mime_type: non_empty(d.mime_type()),
                file_name: non_empty(d.file_name()),
                thumbnail: d.thumbnail().as_ref().map(|t| remote_file(t.file())),
            };
            (Some(plain_text(document.caption())), Some(attachment))
        }
        MessageContent::MessageAnimation(animation) => {
            (Some(plain_text(animation.caption())), None)
        }
        _ => (None, None),
    }
}

fn plain_text(formatted_text: &FormattedText) -> String {
    formatted_text.text().clone()
}

fn non_empty(value: &str) -> Option<String> {
    Some(value).filter(|s| !s.is_empty()).map(str::to_string)
}

fn remote_file(file: &TdFile) -> RemoteFile {
    RemoteFile {
        local_id: file.id(),
        remote_id: file.remote().id().clone(),
        access_hash: None,
        file_reference: Some(file.remote().unique_id().clone()).filter(|s| !s.is_empty()),
        dc_id: None,
    }
}
