//! One JSON message per line, the framing every relay connection speaks.

use futures_util::{stream, Stream};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{consts::MAX_LINE_BYTES, error::CodecError};

pub async fn write_message<W, M>(writer: &mut W, message: &M) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    let data = serde_json::to_string(message)? + "\n";

    writer.write_all(data.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}

/// Reads one line without its newline, never buffering more than `MAX_LINE_BYTES`.
/// `Ok(None)` means the peer closed the connection.
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = reader
        .take(MAX_LINE_BYTES as u64)
        .read_line(&mut line)
        .await?;

    if read == 0 {
        return Ok(None);
    }

    if !line.ends_with('\n') && read == MAX_LINE_BYTES {
        return Err(CodecError::LineTooLong(MAX_LINE_BYTES));
    }

    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);

    Ok(Some(line))
}

/// Reads the next message. `Ok(None)` means the peer closed the connection.
pub async fn read_message<R, M>(reader: &mut R) -> Result<Option<M>, CodecError>
where
    R: AsyncBufRead + Unpin,
    M: DeserializeOwned,
{
    match read_line(reader).await? {
        Some(line) => Ok(Some(serde_json::from_str(&line)?)),
        None => Ok(None),
    }
}

/// Every line until EOF. The stream ends after the first error.
pub fn lines<R>(reader: R) -> impl Stream<Item = Result<String, CodecError>>
where
    R: AsyncBufRead + Unpin,
{
    stream::unfold(Some(reader), |state| async move {
        let Some(mut reader) = state else {
            return None;
        };

        match read_line(&mut reader).await {
            Ok(Some(line)) => Some((Ok(line), Some(reader))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio::io::{duplex, split, BufReader};

    use super::*;
    use crate::utils::json_parser::{CommonMessages, Role};

    #[tokio::test]
    async fn messages_cross_a_stream_one_per_line() {
        let (client, server) = duplex(1024);
        let (_, mut w) = split(client);
        let (r, _server_w) = split(server);
        let mut reader = BufReader::new(r);

        let first = CommonMessages::Identification {
            id: 1,
            role: Role::Passenger,
        };
        let second = CommonMessages::Identification {
            id: 2,
            role: Role::Driver,
        };

        write_message(&mut w, &first).await.unwrap();
        write_message(&mut w, &second).await.unwrap();
        drop(w);

        let got: Option<CommonMessages> = read_message(&mut reader).await.unwrap();
        assert_eq!(got, Some(first));
        let got: Option<CommonMessages> = read_message(&mut reader).await.unwrap();
        assert_eq!(got, Some(second));
    }

    #[tokio::test]
    async fn eof_reads_as_none() {
        let mut reader = BufReader::new(&b""[..]);
        let got: Option<CommonMessages> = read_message(&mut reader).await.unwrap();

        assert!(got.is_none());
    }

    #[tokio::test]
    async fn endless_line_is_cut_off() {
        let data = "x".repeat(MAX_LINE_BYTES * 2);
        let mut reader = BufReader::new(data.as_bytes());
        let got: Result<Option<CommonMessages>, _> = read_message(&mut reader).await;

        assert!(matches!(got, Err(CodecError::LineTooLong(MAX_LINE_BYTES))));
    }

    #[tokio::test]
    async fn lines_stop_at_eof_and_after_an_error() {
        let data = format!("one\r\ntwo\n{}", "x".repeat(MAX_LINE_BYTES + 1));
        let got: Vec<_> = lines(BufReader::new(data.as_bytes())).collect().await;

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].as_deref().unwrap(), "one");
        assert_eq!(got[1].as_deref().unwrap(), "two");
        assert!(matches!(got[2], Err(CodecError::LineTooLong(_))));

        let got: Vec<_> = lines(BufReader::new(&b"last"[..])).collect().await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].as_deref().unwrap(), "last");
    }

    #[tokio::test]
    async fn garbage_is_a_json_error() {
        let mut reader = BufReader::new(&b"not json\n"[..]);
        let got: Result<Option<CommonMessages>, _> = read_message(&mut reader).await;

        assert!(matches!(got, Err(CodecError::Json(_))));
    }
}
