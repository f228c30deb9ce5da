use limero_msg::{fnv1a_32, Body, Link, LinkConfig, Message, MsgHeader, MsgKind, PropertyInfo};

use crate::cmd::EncodeArgs;
use crate::exit::{msg_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let msg = build_message(header_from(&args), &args)?;

    let mut link = Link::new(LinkConfig::symmetric(args.max_frame));
    let frame = link
        .produce_frame(&msg)
        .map_err(|err| msg_error("encode failed", err))?;

    print_message(&msg, frame.len(), Some(frame), format);
    if matches!(format, OutputFormat::Pretty | OutputFormat::Table) {
        println!("{}", hex::encode(frame));
    }
    Ok(SUCCESS)
}

fn header_from(args: &EncodeArgs) -> MsgHeader {
    MsgHeader {
        dst: args.dst,
        src: args.src.or_else(|| args.src_name.as_deref().map(fnv1a_32)),
        kind: args.kind.into(),
        ret_code: args.ret_code,
        msg_id: args.msg_id,
        qos: args.qos,
    }
}

fn build_message(header: MsgHeader, args: &EncodeArgs) -> CliResult<Message> {
    let info = match (args.info_id, &args.info_name) {
        (Some(id), Some(name)) => {
            let mut info = PropertyInfo::new(id, name.clone());
            info.description = args.info_description.clone();
            info.value_type = args.info_type.map(Into::into);
            info.mode = args.info_mode.map(Into::into);
            Some(info)
        }
        _ => None,
    };

    let body = match header.kind {
        MsgKind::Info => match info {
            Some(info) if args.values.is_empty() => Body::Info(info),
            Some(_) => return Err(CliError::usage("--value is only valid for publish")),
            None => return Err(CliError::usage("info messages need --info-id and --info-name")),
        },
        MsgKind::Publish if info.is_some() => {
            return Err(CliError::usage("--info-* flags need --kind info"))
        }
        MsgKind::Publish if args.values.is_empty() => Body::Empty,
        MsgKind::Publish => Body::Values(args.values.clone()),
        kind => {
            if info.is_some() || !args.values.is_empty() {
                return Err(CliError::usage(format!("{kind} messages carry no body")));
            }
            Body::Empty
        }
    };

    Ok(Message::new(header, body))
}
